// # Host Inventory Trait
//
// Defines the interface to the external service that knows which devices
// are on a network (a router's host table, typically).
//
// ## Implementations
//
// - File-based (JSON host list): `crate::inventory::FileInventory`
// - In-memory: `crate::inventory::StaticInventory`
// - Router clients (TR-064 and friends) live outside this crate and are
//   plugged in through `InventoryRegistry`
//
// ## Usage
//
// ```rust,ignore
// use fritzdns_core::HostInventory;
//
// let inventory = /* HostInventory implementation */;
// for host in inventory.host_list().await? {
//     println!("{} -> {} (active: {})", host.name, host.ip, host.active);
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{InventoryConfig, SourceConfig};

/// One entry of a host list as reported by the inventory
///
/// Nothing about it is trusted: the name is whatever the device announced
/// and the address is an unparsed string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHostRecord {
    /// Reported host name
    pub name: String,
    /// Reported address, unparsed
    pub ip: String,
    /// Whether the device is currently connected
    #[serde(default)]
    pub active: bool,
}

impl RawHostRecord {
    /// Create a new raw record
    pub fn new(name: impl Into<String>, ip: impl Into<String>, active: bool) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            active,
        }
    }
}

/// Trait for inventory backends
///
/// One instance serves exactly one source and is called from that source's
/// poll task only, once per cycle.
///
/// # Contract
///
/// - Return the complete host list, in whatever order the service reports it
/// - Fail with [`crate::Error::Inventory`] when the service cannot be reached;
///   the poller keeps the previous snapshot and tries again next cycle
/// - Do not retry or back off internally; the poll interval is the retry
/// - Bound your own I/O if you can. The poller may add a timeout on top, but an
///   expired timeout only abandons the result, it cannot interrupt a blocking call
#[async_trait]
pub trait HostInventory: Send + Sync {
    /// Fetch the current host list
    async fn host_list(&self) -> Result<Vec<RawHostRecord>, crate::Error>;

    /// Short backend name for log lines
    fn backend_name(&self) -> &'static str;
}

/// Helper trait for constructing inventories from configuration
pub trait InventoryFactory: Send + Sync {
    /// Create an inventory for one source
    ///
    /// # Parameters
    ///
    /// - `config`: Backend configuration shared by all sources
    /// - `source`: The source to serve, carrying address and credentials
    fn create(
        &self,
        config: &InventoryConfig,
        source: &SourceConfig,
    ) -> Result<std::sync::Arc<dyn HostInventory>, crate::Error>;
}
