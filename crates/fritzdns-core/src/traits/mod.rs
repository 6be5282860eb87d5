//! Core traits for fritzdns
//!
//! - [`HostInventory`]: Fetch the host list of one monitored source
//! - [`InventoryFactory`]: Build inventories from configuration

pub mod host_inventory;

pub use host_inventory::{HostInventory, InventoryFactory, RawHostRecord};
