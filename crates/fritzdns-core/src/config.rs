//! Configuration types for fritzdns
//!
//! This module defines the configuration handed to the core. Loading it from
//! disk or the environment is the embedding application's job; the core only
//! normalises and validates what it is given.

use crate::name::{ROOT, canonical_name};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name the router reports for itself in its own host list
pub const DEFAULT_GATEWAY_NAME: &str = "fritz.box";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Which inventory backend to build for each source
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Monitored sources, in the order answers are produced
    pub sources: Vec<SourceConfig>,

    /// Poll loop settings
    #[serde(default)]
    pub poller: PollerConfig,
}

impl DnsConfig {
    /// Create a configuration for the given sources with default settings
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        Self {
            inventory: InventoryConfig::default(),
            sources,
            poller: PollerConfig::default(),
        }
    }

    /// Bring every source's domain into canonical form
    pub fn normalize(&mut self) {
        for source in &mut self.sources {
            source.domain = canonical_name(source.domain.trim());
            source.address = source.address.trim().to_string();
        }
    }

    /// Validate the configuration
    ///
    /// Expects [`DnsConfig::normalize`] to have run, otherwise two spellings of
    /// the same domain slip past the uniqueness check.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.sources.is_empty() {
            return Err(crate::Error::config("No sources configured"));
        }

        let mut domains = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !domains.insert(source.domain.as_str()) {
                return Err(crate::Error::config(format!(
                    "Domain {} is configured for more than one source",
                    source.domain
                )));
            }
        }

        self.inventory.validate()?;
        self.poller.validate()?;

        Ok(())
    }
}

/// One monitored inventory endpoint and the domain it answers for
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Network address of the inventory service (for the file backend, a path)
    pub address: String,

    /// Domain suffix this source is responsible for, e.g. `fritz.box.`
    pub domain: String,

    /// Login user
    #[serde(default)]
    pub username: String,

    /// Login password
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub password: String,
}

impl SourceConfig {
    /// Create a source with a canonical domain and no credentials
    pub fn new(address: impl Into<String>, domain: &str) -> Self {
        Self {
            address: address.into(),
            domain: canonical_name(domain),
            username: String::new(),
            password: String::new(),
        }
    }

    /// Set the login credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Validate a single source descriptor
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.address.is_empty() {
            return Err(crate::Error::config("Source address cannot be empty"));
        }
        if self.domain.is_empty() || self.domain == ROOT {
            return Err(crate::Error::config(format!(
                "Source {} needs a non-root domain",
                self.address
            )));
        }
        Ok(())
    }
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("address", &self.address)
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Inventory backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InventoryConfig {
    /// JSON host list on disk, the source address is its path
    #[default]
    File,

    /// Backend registered by the embedding application
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        #[serde(default)]
        config: serde_json::Value,
    },
}

impl InventoryConfig {
    /// Validate the inventory configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            InventoryConfig::Custom { factory, .. } if factory.is_empty() => Err(
                crate::Error::config("Custom inventory factory cannot be empty"),
            ),
            _ => Ok(()),
        }
    }

    /// Get the registry name of the backend
    pub fn type_name(&self) -> &str {
        match self {
            InventoryConfig::File => "file",
            InventoryConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Seconds between the start of two poll cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound on a single fetch in seconds, 0 leaves it to the backend
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Host name the router uses for itself, never resolvable
    #[serde(default = "default_gateway_name")]
    pub gateway_name: String,

    /// Capacity of the poll event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// How long shutdown waits for poll tasks to wind down
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl PollerConfig {
    /// Validate the poller settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            gateway_name: default_gateway_name(),
            event_channel_capacity: default_event_channel_capacity(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_gateway_name() -> String {
    DEFAULT_GATEWAY_NAME.to_string()
}

fn default_event_channel_capacity() -> usize {
    100
}

fn default_drain_timeout_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(domains: &[&str]) -> DnsConfig {
        DnsConfig::new(
            domains
                .iter()
                .enumerate()
                .map(|(i, d)| SourceConfig::new(format!("10.0.{i}.1"), d))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_from_minimal_json() {
        let json = r#"{ "sources": [ { "address": "192.168.178.1", "domain": "Fritz.Box" } ] }"#;
        let mut config: DnsConfig = serde_json::from_str(json).unwrap();
        config.normalize();

        assert!(config.validate().is_ok());
        assert_eq!(config.sources[0].domain, "fritz.box.");
        assert_eq!(config.poller.interval_secs, 60);
        assert_eq!(config.poller.gateway_name, "fritz.box");
        assert_eq!(config.inventory.type_name(), "file");
    }

    #[test]
    fn test_custom_inventory_json() {
        let json = r#"{
            "inventory": { "type": "custom", "factory": "tr064" },
            "sources": [ { "address": "192.168.178.1", "domain": "lan.", "username": "u", "password": "p" } ]
        }"#;
        let config: DnsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.inventory.type_name(), "tr064");
    }

    #[test]
    fn test_rejects_empty_and_duplicate_sources() {
        assert!(config(&[]).validate().is_err());
        assert!(config(&["lan1.example", "LAN1.example."]).validate().is_err());
        assert!(config(&["lan1.example", "lan2.example"]).validate().is_ok());

        let mut root = config(&["lan1.example"]);
        root.sources[0].domain = ".".to_string();
        assert!(root.validate().is_err());

        let mut no_address = config(&["lan1.example"]);
        no_address.sources[0].address.clear();
        assert!(no_address.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = config(&["lan1.example"]);
        config.poller.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let source = SourceConfig::new("192.168.178.1", "fritz.box").with_credentials("admin", "hunter2");
        let debug = format!("{:?}", source);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<REDACTED>"));
    }
}
