// # File Inventory
//
// Reads a source's host list from a JSON file on every poll.
//
// ## Purpose
//
// Lets a network without a reachable router API (or a test rig) feed hosts in
// by writing a file: an exporter cron job, a DHCP lease hook, a hand-written
// list. The file is re-read each cycle, so edits show up within one interval.
//
// ## Failure Behavior
//
// A missing, unreadable or malformed file is a fetch failure like any other:
// the poller keeps serving the previous snapshot. An empty list is not a
// failure and does clear the table.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "hosts": [
//     { "name": "printer", "ip": "192.168.178.7", "active": true }
//   ]
// }
// ```
//
// A bare array of hosts is accepted as well.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

use crate::Error;
use crate::config::{InventoryConfig, SourceConfig};
use crate::traits::{HostInventory, InventoryFactory, RawHostRecord};

/// Host list file format version
const HOST_FILE_VERSION: &str = "1.0";

/// Serializable host list file formats
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum HostFileFormat {
    Versioned {
        version: String,
        hosts: Vec<RawHostRecord>,
    },
    Bare(Vec<RawHostRecord>),
}

/// Inventory backed by a JSON host list file
///
/// # Example
///
/// ```rust,no_run
/// use fritzdns_core::inventory::FileInventory;
/// use fritzdns_core::traits::HostInventory;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let inventory = FileInventory::new("/var/lib/fritzdns/hosts.json");
///     let hosts = inventory.host_list().await?;
///     println!("{} hosts", hosts.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    /// Create an inventory reading from `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the host list file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a host list in the versioned format
    ///
    /// Writes to a temporary file first and renames it into place, so a poll
    /// running at the same time reads either the old list or the new one.
    pub async fn write(&self, hosts: &[RawHostRecord]) -> Result<(), Error> {
        let file = HostFileFormat::Versioned {
            version: HOST_FILE_VERSION.to_string(),
            hosts: hosts.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        fs::write(&temp, json.as_bytes()).await?;
        fs::rename(&temp, &self.path).await?;

        tracing::trace!("Host list written to {}", self.path.display());
        Ok(())
    }

    fn address(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl HostInventory for FileInventory {
    async fn host_list(&self) -> Result<Vec<RawHostRecord>, Error> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::inventory(self.address(), format!("Failed to read host list: {}", e)))?;

        let file: HostFileFormat = serde_json::from_str(&content)
            .map_err(|e| Error::inventory(self.address(), format!("Failed to parse host list: {}", e)))?;

        match file {
            HostFileFormat::Versioned { version, hosts } => {
                if version != HOST_FILE_VERSION {
                    tracing::warn!(
                        "Host list {} has version {}, expected {}. Reading anyway.",
                        self.path.display(),
                        version,
                        HOST_FILE_VERSION
                    );
                }
                Ok(hosts)
            }
            HostFileFormat::Bare(hosts) => Ok(hosts),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

/// Factory building a [`FileInventory`] from each source's address
pub struct FileInventoryFactory;

impl InventoryFactory for FileInventoryFactory {
    fn create(
        &self,
        config: &InventoryConfig,
        source: &SourceConfig,
    ) -> Result<Arc<dyn HostInventory>, Error> {
        match config {
            InventoryConfig::File => Ok(Arc::new(FileInventory::new(&source.address))),
            _ => Err(Error::config("Invalid config for file inventory")),
        }
    }
}
