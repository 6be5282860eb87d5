// # Static Inventory
//
// In-memory implementation of HostInventory.
//
// ## Purpose
//
// Serves a host list held in memory. The embedding application (or a test)
// swaps the list whenever it likes; the next poll picks it up. Useful for
// tests, demos, and for applications that learn about hosts some other way
// (mDNS, their own DHCP server) and only want the resolution side.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::{HostInventory, RawHostRecord};

/// In-memory inventory
///
/// Clones share the same list.
///
/// # Example
///
/// ```rust,no_run
/// use fritzdns_core::inventory::StaticInventory;
/// use fritzdns_core::traits::{HostInventory, RawHostRecord};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let inventory = StaticInventory::new(vec![RawHostRecord::new("nas", "10.0.0.20", true)]);
///     inventory.set_hosts(Vec::new()).await;
///     assert!(inventory.host_list().await?.is_empty());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    hosts: Arc<RwLock<Vec<RawHostRecord>>>,
}

impl StaticInventory {
    /// Create an inventory serving `hosts`
    pub fn new(hosts: Vec<RawHostRecord>) -> Self {
        Self {
            hosts: Arc::new(RwLock::new(hosts)),
        }
    }

    /// Replace the served list
    pub async fn set_hosts(&self, hosts: Vec<RawHostRecord>) {
        *self.hosts.write().await = hosts;
    }

    /// Append one host to the served list
    pub async fn push(&self, host: RawHostRecord) {
        self.hosts.write().await.push(host);
    }
}

#[async_trait]
impl HostInventory for StaticInventory {
    async fn host_list(&self) -> Result<Vec<RawHostRecord>, Error> {
        Ok(self.hosts.read().await.clone())
    }

    fn backend_name(&self) -> &'static str {
        "static"
    }
}
