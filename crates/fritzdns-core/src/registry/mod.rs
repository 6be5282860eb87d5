//! Plugin-based inventory registry
//!
//! Inventory backends are registered by name and instantiated from
//! configuration, so a router client living in another crate plugs in without
//! the core knowing about it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fritzdns_core::registry::InventoryRegistry;
//!
//! let registry = InventoryRegistry::with_builtins();
//!
//! // In a router client crate
//! registry.register_inventory("tr064", Box::new(Tr064Factory));
//!
//! // Then, per configured source
//! let inventory = registry.create_inventory(&config.inventory, &source)?;
//! ```

use crate::config::{InventoryConfig, SourceConfig};
use crate::error::{Error, Result};
use crate::inventory::FileInventoryFactory;
use crate::traits::{HostInventory, InventoryFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry of inventory factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct InventoryRegistry {
    inventories: RwLock<HashMap<String, Box<dyn InventoryFactory>>>,
}

impl InventoryRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in `file` backend registered
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_inventory("file", Box::new(FileInventoryFactory));
        registry
    }

    /// Register an inventory factory
    ///
    /// # Parameters
    ///
    /// - `name`: Backend name as used in configuration (e.g., "file", "tr064")
    /// - `factory`: Factory object for creating inventory instances
    pub fn register_inventory(&self, name: impl Into<String>, factory: Box<dyn InventoryFactory>) {
        let name = name.into();
        let mut inventories = self
            .inventories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        inventories.insert(name, factory);
    }

    /// Create the inventory for one source
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn HostInventory>)`: Created inventory
    /// - `Err(Error)`: If the backend is not registered or creation fails
    pub fn create_inventory(
        &self,
        config: &InventoryConfig,
        source: &SourceConfig,
    ) -> Result<Arc<dyn HostInventory>> {
        let inventory_type = config.type_name();
        let inventories = self
            .inventories
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = inventories
            .get(inventory_type)
            .ok_or_else(|| Error::config(format!("Unknown inventory type: {}", inventory_type)))?;

        factory.create(config, source)
    }

    /// List all registered backend names
    pub fn list_inventories(&self) -> Vec<String> {
        let inventories = self
            .inventories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        inventories.keys().cloned().collect()
    }

    /// Check if a backend name is registered
    pub fn has_inventory(&self, name: &str) -> bool {
        let inventories = self
            .inventories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        inventories.contains_key(name)
    }
}
