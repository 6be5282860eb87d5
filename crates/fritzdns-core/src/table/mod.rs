//! Per-source resolution table
//!
//! Holds the current [`Snapshot`] of one source behind an atomic pointer swap.
//! Readers load the pointer without taking a lock, so a lookup never waits on
//! a poll cycle; the poller builds the next snapshot entirely off to the side
//! and publishes it with a single store.

use std::net::IpAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::snapshot::{Lookup, Snapshot};

/// Concurrency-safe holder of one source's latest snapshot
///
/// Starts out empty; every lookup before the first successful poll reports
/// [`Lookup::Missing`].
#[derive(Debug)]
pub struct ResolutionTable {
    current: ArcSwap<Snapshot>,
}

impl ResolutionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty()),
        }
    }

    /// Publish a new snapshot, replacing the visible mapping wholesale
    ///
    /// Returns the snapshot that was replaced.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.current.swap(Arc::new(snapshot))
    }

    /// Look up a canonical host name in the current snapshot
    pub fn lookup(&self, name: &str) -> Lookup {
        self.current.load().lookup(name)
    }

    /// Address of a canonical host name, if it has a usable one
    pub fn addr(&self, name: &str) -> Option<IpAddr> {
        self.lookup(name).addr()
    }

    /// The current snapshot
    ///
    /// The returned handle stays valid (and unchanged) across later replaces.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Number of hosts in the current snapshot
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// Check if the current snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Default for ResolutionTable {
    fn default() -> Self {
        Self::new()
    }
}
