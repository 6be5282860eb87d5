//! Deduplicating snapshot builder
//!
//! A router's host list is noisy: the router lists itself, devices that never
//! announced a name get generated `PC-…` placeholders, and a device that moved
//! between interfaces shows up several times with only one entry active. The
//! [`SnapshotBuilder`] turns one such list into a [`Snapshot`], a clean
//! canonical-name → address map.
//!
//! ## Precedence
//!
//! The list is scanned once, in the order the inventory returned it, keeping a
//! working map keyed by the raw name. A record is skipped when:
//!
//! 1. its name is the gateway's own name,
//! 2. an *active* record of the same raw name was already kept,
//! 3. its name looks like a MAC, IPv4 or IPv6 placeholder.
//!
//! Anything else is kept, overwriting an earlier inactive record of the same
//! name. The outcome depends on scan order: an inactive record seen
//! first is replaced by a later one, an active record seen first is not.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::RegexSet;
use tracing::debug;

use crate::config::DEFAULT_GATEWAY_NAME;
use crate::name::canonical_name;
use crate::traits::RawHostRecord;

/// Generated names for devices that never announced one. Unanchored, so a
/// match anywhere in the name disqualifies it.
static PLACEHOLDERS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"PC(-[A-Z0-9]{1,2}){6}",
        r"PC(-\d{1,3}){4}",
        r"PC(-[a-z0-9]{0,4}){6}",
    ])
    .expect("placeholder patterns are valid")
});

/// Whether a raw host name is a generated placeholder
pub fn is_placeholder(name: &str) -> bool {
    PLACEHOLDERS.is_match(name)
}

/// Result of looking a host up in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The host is known and has a usable address
    Found(IpAddr),
    /// The host is known but its reported address did not parse
    Unaddressed,
    /// The host is not in the snapshot
    Missing,
}

impl Lookup {
    /// The address, if there is one to answer with
    pub fn addr(self) -> Option<IpAddr> {
        match self {
            Lookup::Found(ip) => Some(ip),
            Lookup::Unaddressed | Lookup::Missing => None,
        }
    }

    /// Whether the host name exists at all
    pub fn is_known(self) -> bool {
        !matches!(self, Lookup::Missing)
    }
}

/// One entry of a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHost {
    /// Canonical host name
    pub name: String,
    /// Parsed address, `None` if the reported one was malformed
    pub addr: Option<IpAddr>,
}

/// Immutable canonical-name → address map for one source
#[derive(Debug, Clone)]
pub struct Snapshot {
    hosts: HashMap<String, Option<IpAddr>>,
    built_at: DateTime<Utc>,
    source_records: usize,
}

impl Snapshot {
    /// An empty snapshot, what a table holds before its first poll
    pub fn empty() -> Self {
        Self {
            hosts: HashMap::new(),
            built_at: Utc::now(),
            source_records: 0,
        }
    }

    /// Look up a canonical host name
    pub fn lookup(&self, name: &str) -> Lookup {
        match self.hosts.get(name) {
            Some(Some(ip)) => Lookup::Found(*ip),
            Some(None) => Lookup::Unaddressed,
            None => Lookup::Missing,
        }
    }

    /// Number of distinct host names
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Check if the snapshot holds no hosts
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// When the snapshot was built
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// How many raw records the snapshot was built from
    pub fn source_records(&self) -> usize {
        self.source_records
    }

    /// All entries, sorted by name
    pub fn hosts(&self) -> Vec<ResolvedHost> {
        let mut hosts: Vec<_> = self
            .hosts
            .iter()
            .map(|(name, addr)| ResolvedHost {
                name: name.clone(),
                addr: *addr,
            })
            .collect();
        hosts.sort_by(|a, b| a.name.cmp(&b.name));
        hosts
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Mapping equality; build time and record count are bookkeeping
impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.hosts == other.hosts
    }
}

impl Eq for Snapshot {}

/// Builds snapshots from raw host lists
///
/// Pure and deterministic: the same list always produces the same mapping.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    gateway_name: String,
}

impl SnapshotBuilder {
    /// Create a builder that drops the default gateway name
    pub fn new() -> Self {
        Self::with_gateway_name(DEFAULT_GATEWAY_NAME)
    }

    /// Create a builder that drops a custom gateway name
    pub fn with_gateway_name(gateway_name: impl Into<String>) -> Self {
        Self {
            gateway_name: gateway_name.into(),
        }
    }

    /// Build a snapshot from one poll cycle's host list
    pub fn build(&self, records: &[RawHostRecord]) -> Snapshot {
        // raw name -> index of the record currently kept for it
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let name = record.name.as_str();

            if name == self.gateway_name {
                continue;
            }
            if seen.get(name).is_some_and(|&kept| records[kept].active) {
                continue;
            }
            if is_placeholder(name) {
                continue;
            }
            seen.insert(name, index);
        }

        // Replay survivors in scan order so that two raw names folding onto
        // one canonical name resolve the same way every time.
        let mut kept: Vec<usize> = seen.into_values().collect();
        kept.sort_unstable();

        let mut hosts = HashMap::with_capacity(kept.len());
        for index in kept {
            let record = &records[index];
            let addr = match record.ip.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(e) => {
                    debug!(
                        "Host {} reported unparsable address '{}': {}",
                        record.name, record.ip, e
                    );
                    None
                }
            };
            hosts.insert(canonical_name(&record.name), addr);
        }

        Snapshot {
            hosts,
            built_at: Utc::now(),
            source_records: records.len(),
        }
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
