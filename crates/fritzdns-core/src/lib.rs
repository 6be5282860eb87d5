// # fritzdns-core
//
// Core library answering DNS A queries for the hosts a router knows about.
//
// ## Architecture Overview
//
// - **HostInventory**: Trait for fetching a source's raw host list
// - **SnapshotBuilder**: Deduplicates a raw host list into a name → address map
// - **ResolutionTable**: Lock-free holder of a source's latest snapshot
// - **Responder**: Answers parsed queries from the tables, or delegates
// - **SourcePoller**: Background task refreshing one table on an interval
// - **DnsEngine**: Builds and runs all of the above from a `DnsConfig`
// - **InventoryRegistry**: Plugin-based registry for inventory backends
//
// ## Design Principles
//
// 1. **Stale over empty**: A failed fetch never clears what was last known
// 2. **Readers never wait**: Snapshots are published by pointer swap
// 3. **Delegate, don't deny**: No match means "ask the next resolver"
// 4. **Library-First**: Transport and router clients are plugged in from outside

pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod name;
pub mod poller;
pub mod registry;
pub mod responder;
pub mod snapshot;
pub mod table;
pub mod traits;

// Re-export core types for convenience
pub use config::{DnsConfig, InventoryConfig, PollerConfig, SourceConfig};
pub use engine::DnsEngine;
pub use error::{Error, Result};
pub use inventory::{FileInventory, StaticInventory};
pub use poller::{PollEvent, SourcePoller};
pub use registry::InventoryRegistry;
pub use responder::{Answer, Outcome, Query, RecordType, Responder, Response};
pub use snapshot::{Lookup, Snapshot, SnapshotBuilder};
pub use table::ResolutionTable;
pub use traits::{HostInventory, RawHostRecord};
