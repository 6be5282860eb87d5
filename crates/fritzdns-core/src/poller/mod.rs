//! Per-source poll task
//!
//! Each configured source gets one [`SourcePoller`] running on its own task:
//!
//! ```text
//!   ┌──────────── tick / cancel ◄────────────┐
//!   ▼                                        │
//! fetch ──ok──► build snapshot ──► replace ──┤
//!   │                                        │
//!   └──err──► log, keep previous snapshot ───┘
//! ```
//!
//! The first cycle runs immediately. A failed fetch never touches the table
//! and is not retried before the next tick. Cancellation is only observed while
//! waiting for a tick: a fetch in flight completes (or times out) and its
//! result is still published before the task exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{PollerConfig, SourceConfig};
use crate::error::{Error, Result};
use crate::snapshot::SnapshotBuilder;
use crate::table::ResolutionTable;
use crate::traits::{HostInventory, RawHostRecord};

/// Events emitted by poll tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// Poll task started
    Started {
        domain: String,
    },

    /// A new snapshot was published
    Refreshed {
        domain: String,
        /// Distinct host names in the new snapshot
        hosts: usize,
        /// Raw records the inventory returned
        records: usize,
    },

    /// The inventory could not be fetched, the previous snapshot stays
    FetchFailed {
        domain: String,
        address: String,
        error: String,
    },

    /// Poll task stopped after cancellation
    Stopped {
        domain: String,
    },
}

/// Refreshes one source's resolution table on a fixed interval
#[derive(Clone)]
pub struct SourcePoller {
    /// Canonical domain of the source
    domain: String,

    /// Inventory address, for log lines
    address: String,

    /// Where host lists come from
    inventory: Arc<dyn HostInventory>,

    /// Where snapshots go
    table: Arc<ResolutionTable>,

    /// Dedup policy
    builder: SnapshotBuilder,

    /// Time between cycle starts
    interval: Duration,

    /// Bound on a single fetch
    fetch_timeout: Option<Duration>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<PollEvent>,
}

impl SourcePoller {
    /// Create a poller with explicit timings
    pub fn new(
        source: &SourceConfig,
        inventory: Arc<dyn HostInventory>,
        table: Arc<ResolutionTable>,
        interval: Duration,
        event_tx: mpsc::Sender<PollEvent>,
    ) -> Self {
        Self {
            domain: source.domain.clone(),
            address: source.address.clone(),
            inventory,
            table,
            builder: SnapshotBuilder::new(),
            interval,
            fetch_timeout: None,
            event_tx,
        }
    }

    /// Create a poller from poller configuration
    pub fn from_config(
        source: &SourceConfig,
        config: &PollerConfig,
        inventory: Arc<dyn HostInventory>,
        table: Arc<ResolutionTable>,
        event_tx: mpsc::Sender<PollEvent>,
    ) -> Self {
        let timeout = (config.fetch_timeout_secs > 0)
            .then(|| Duration::from_secs(config.fetch_timeout_secs));

        Self::new(
            source,
            inventory,
            table,
            Duration::from_secs(config.interval_secs),
            event_tx,
        )
        .with_builder(SnapshotBuilder::with_gateway_name(&config.gateway_name))
        .with_fetch_timeout(timeout)
    }

    /// Use a different snapshot builder
    pub fn with_builder(mut self, builder: SnapshotBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Bound each fetch, `None` leaves it to the inventory
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Canonical domain of the source
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The table this poller writes to
    pub fn table(&self) -> &Arc<ResolutionTable> {
        &self.table
    }

    /// Run until `cancel` fires
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            "Polling {} for {} every {:?}",
            self.address, self.domain, self.interval
        );
        self.emit_event(PollEvent::Started {
            domain: self.domain.clone(),
        });

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // Outcome is logged and emitted inside
            let _ = self.poll_once().await;
        }

        info!("Stopped polling {} for {}", self.address, self.domain);
        self.emit_event(PollEvent::Stopped {
            domain: self.domain.clone(),
        });
    }

    /// Run a single fetch → build → replace cycle
    ///
    /// # Returns
    ///
    /// - `Ok(usize)`: Number of hosts in the published snapshot
    /// - `Err(Error)`: The fetch failed, the table is untouched
    pub async fn poll_once(&self) -> Result<usize> {
        let records = match self.fetch().await {
            Ok(records) => records,
            Err(e) => {
                error!("{}: failed to fetch host list: {}", self.address, e);
                self.emit_event(PollEvent::FetchFailed {
                    domain: self.domain.clone(),
                    address: self.address.clone(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let snapshot = self.builder.build(&records);
        let hosts = snapshot.len();
        let previous = self.table.replace(snapshot);

        debug!(
            "{}: {} hosts from {} records for {} (was {})",
            self.address,
            hosts,
            records.len(),
            self.domain,
            previous.len()
        );
        self.emit_event(PollEvent::Refreshed {
            domain: self.domain.clone(),
            hosts,
            records: records.len(),
        });

        Ok(hosts)
    }

    async fn fetch(&self) -> Result<Vec<RawHostRecord>> {
        let fetch = self.inventory.host_list();
        match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| Error::Timeout(limit.as_secs()))?,
            None => fetch.await,
        }
    }

    fn emit_event(&self, event: PollEvent) {
        // Dropped rather than awaited so a slow consumer never stalls polling
        if self.event_tx.try_send(event).is_err() {
            warn!("Poll event channel full or closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::StaticInventory;
    use crate::snapshot::Lookup;

    struct HangingInventory;

    #[async_trait::async_trait]
    impl HostInventory for HangingInventory {
        async fn host_list(&self) -> Result<Vec<RawHostRecord>> {
            std::future::pending().await
        }

        fn backend_name(&self) -> &'static str {
            "hanging"
        }
    }

    fn poller(inventory: Arc<dyn HostInventory>) -> (SourcePoller, mpsc::Receiver<PollEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let source = SourceConfig::new("192.168.178.1", "fritz.box");
        let poller = SourcePoller::new(
            &source,
            inventory,
            Arc::new(ResolutionTable::new()),
            Duration::from_secs(60),
            tx,
        );
        (poller, rx)
    }

    #[tokio::test]
    async fn test_poll_once_publishes_snapshot() {
        let inventory = StaticInventory::new(vec![
            RawHostRecord::new("fritz.box", "192.168.178.1", true),
            RawHostRecord::new("nas", "192.168.178.20", true),
        ]);
        let (poller, mut rx) = poller(Arc::new(inventory));

        assert_eq!(poller.poll_once().await.unwrap(), 1);
        assert_eq!(
            poller.table().lookup("nas."),
            Lookup::Found("192.168.178.20".parse().unwrap())
        );
        assert_eq!(
            rx.recv().await,
            Some(PollEvent::Refreshed {
                domain: "fritz.box.".into(),
                hosts: 1,
                records: 2,
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_failure() {
        let (poller, mut rx) = poller(Arc::new(HangingInventory));
        let poller = poller.with_fetch_timeout(Some(Duration::from_millis(20)));

        let err = poller.poll_once().await.unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
        assert!(matches!(rx.recv().await, Some(PollEvent::FetchFailed { .. })));
        assert!(poller.table().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let (poller, mut rx) = poller(Arc::new(StaticInventory::default()));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(poller.run(cancel.clone()));
        assert_eq!(
            rx.recv().await,
            Some(PollEvent::Started {
                domain: "fritz.box.".into()
            })
        );
        assert!(matches!(rx.recv().await, Some(PollEvent::Refreshed { .. })));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller stops")
            .unwrap();
        assert_eq!(
            rx.recv().await,
            Some(PollEvent::Stopped {
                domain: "fritz.box.".into()
            })
        );
    }

    #[test]
    fn test_from_config_timeout() {
        let (tx, _rx) = mpsc::channel(1);
        let source = SourceConfig::new("192.168.178.1", "fritz.box");
        let mut config = PollerConfig::default();
        config.fetch_timeout_secs = 0;

        let poller = SourcePoller::from_config(
            &source,
            &config,
            Arc::new(StaticInventory::default()),
            Arc::new(ResolutionTable::new()),
            tx,
        );

        assert_eq!(poller.fetch_timeout, None);
        assert_eq!(poller.interval, Duration::from_secs(60));
    }
}
