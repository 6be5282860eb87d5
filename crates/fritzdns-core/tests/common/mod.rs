//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal inventories that replay scripted results and
//! count how often they are asked.

#![allow(dead_code)]

use fritzdns_core::config::{DnsConfig, InventoryConfig, SourceConfig};
use fritzdns_core::error::{Error, Result};
use fritzdns_core::poller::PollEvent;
use fritzdns_core::registry::InventoryRegistry;
use fritzdns_core::traits::{HostInventory, InventoryFactory, RawHostRecord};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Shorthand for a raw host record
pub fn host(name: &str, ip: &str, active: bool) -> RawHostRecord {
    RawHostRecord::new(name, ip, active)
}

/// An inventory replaying queued results, one per fetch
///
/// Once the queue runs dry every fetch fails.
pub struct ScriptedInventory {
    address: String,
    script: Mutex<VecDeque<std::result::Result<Vec<RawHostRecord>, String>>>,
    delay: Duration,
    fetch_count: AtomicUsize,
}

impl ScriptedInventory {
    pub fn new(address: &str) -> Arc<Self> {
        Self::with_delay(address, Duration::ZERO)
    }

    /// Every fetch takes `delay` before returning
    pub fn with_delay(address: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            address: address.to_string(),
            script: Mutex::new(VecDeque::new()),
            delay,
            fetch_count: AtomicUsize::new(0),
        })
    }

    /// Queue a successful fetch
    pub fn push_ok(&self, hosts: Vec<RawHostRecord>) {
        self.script.lock().unwrap().push_back(Ok(hosts));
    }

    /// Queue a failed fetch
    pub fn push_err(&self, message: &str) {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
    }

    /// Number of times host_list() was called
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HostInventory for ScriptedInventory {
    async fn host_list(&self) -> Result<Vec<RawHostRecord>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(hosts)) => Ok(hosts),
            Some(Err(message)) => Err(Error::inventory(&self.address, message)),
            None => Err(Error::inventory(&self.address, "script exhausted")),
        }
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

/// Hands out pre-built scripted inventories by source address
pub struct ScriptedFactory {
    inventories: HashMap<String, Arc<ScriptedInventory>>,
}

impl InventoryFactory for ScriptedFactory {
    fn create(
        &self,
        _config: &InventoryConfig,
        source: &SourceConfig,
    ) -> Result<Arc<dyn HostInventory>> {
        self.inventories
            .get(&source.address)
            .map(|inventory| Arc::clone(inventory) as Arc<dyn HostInventory>)
            .ok_or_else(|| Error::config(format!("No scripted inventory for {}", source.address)))
    }
}

/// A registry with a "scripted" backend serving the given inventories
pub fn scripted_registry(inventories: &[&Arc<ScriptedInventory>]) -> InventoryRegistry {
    let registry = InventoryRegistry::new();
    let inventories = inventories
        .iter()
        .map(|inventory| (inventory.address.clone(), Arc::clone(inventory)))
        .collect();
    registry.register_inventory("scripted", Box::new(ScriptedFactory { inventories }));
    registry
}

/// Config with one source per `(address, domain)` pair on the scripted backend
pub fn scripted_config(sources: &[(&str, &str)]) -> DnsConfig {
    let mut config = DnsConfig::new(
        sources
            .iter()
            .map(|(address, domain)| SourceConfig::new(*address, domain))
            .collect(),
    );
    config.inventory = InventoryConfig::Custom {
        factory: "scripted".to_string(),
        config: serde_json::Value::Null,
    };
    config
}

/// Wait for the first event matching `pred`, skipping others
pub async fn wait_for_event(
    rx: &mut mpsc::Receiver<PollEvent>,
    pred: impl Fn(&PollEvent) -> bool,
) -> PollEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.expect("event channel open");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event arrives within 5 seconds")
}

/// Wait until every source has published its first snapshot
pub async fn wait_for_refreshes(rx: &mut mpsc::Receiver<PollEvent>, count: usize) {
    for _ in 0..count {
        wait_for_event(rx, |e| matches!(e, PollEvent::Refreshed { .. })).await;
    }
}
