//! fritzdns engine
//!
//! The DnsEngine wires the pieces together:
//! - One inventory, table and poller per configured source
//! - One responder reading all tables
//! - One cancellation token stopping every poller
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌───────────────┐
//! │ HostInventory │   │ HostInventory │   (one per source)
//! └───────┬───────┘   └───────┬───────┘
//!         ▼                   ▼
//! ┌───────────────┐   ┌───────────────┐
//! │ SourcePoller  │   │ SourcePoller  │──── PollEvent ───► monitoring
//! └───────┬───────┘   └───────┬───────┘
//!         ▼ replace           ▼ replace
//! ┌───────────────┐   ┌───────────────┐
//! │ResolutionTable│   │ResolutionTable│
//! └───────┬───────┘   └───────┬───────┘
//!         └──── lookup ───────┘
//!                   ▲
//!            ┌──────┴──────┐
//!  Query ───►│  Responder  │───► Answered / Delegate
//!            └─────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::DnsConfig;
use crate::error::Result;
use crate::poller::{PollEvent, SourcePoller};
use crate::registry::InventoryRegistry;
use crate::responder::Responder;
use crate::table::ResolutionTable;

/// Core fritzdns engine
///
/// ## Lifecycle
///
/// 1. Create with [`DnsEngine::new()`]
/// 2. Hand [`DnsEngine::responder()`] to the DNS transport
/// 3. Start with [`DnsEngine::run()`], which returns once the token is
///    cancelled and the pollers have drained
pub struct DnsEngine {
    /// One poller per source, in configuration order
    pollers: Vec<SourcePoller>,

    /// Responder over all tables
    responder: Responder,

    /// How long shutdown waits for pollers
    drain_timeout: Duration,
}

impl DnsEngine {
    /// Create a new engine
    ///
    /// Normalises and validates `config`, then builds each source's inventory
    /// through `registry`. Nothing is fetched yet.
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields poll events
    pub fn new(
        mut config: DnsConfig,
        registry: &InventoryRegistry,
    ) -> Result<(Self, mpsc::Receiver<PollEvent>)> {
        config.normalize();
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.poller.event_channel_capacity);

        let mut pollers = Vec::with_capacity(config.sources.len());
        for source in &config.sources {
            let inventory = registry.create_inventory(&config.inventory, source)?;
            info!(
                "Source {} ({} inventory) serves {}",
                source.address,
                inventory.backend_name(),
                source.domain
            );

            pollers.push(SourcePoller::from_config(
                source,
                &config.poller,
                inventory,
                Arc::new(ResolutionTable::new()),
                tx.clone(),
            ));
        }

        let responder = Responder::new(
            pollers
                .iter()
                .map(|poller| (poller.domain().to_string(), Arc::clone(poller.table()))),
        );

        let engine = Self {
            pollers,
            responder,
            drain_timeout: Duration::from_secs(config.poller.drain_timeout_secs),
        };

        Ok((engine, rx))
    }

    /// A responder over every source's table
    pub fn responder(&self) -> Responder {
        self.responder.clone()
    }

    /// The table of one source, by canonical domain
    pub fn table(&self, domain: &str) -> Option<Arc<ResolutionTable>> {
        self.pollers
            .iter()
            .find(|poller| poller.domain() == domain)
            .map(|poller| Arc::clone(poller.table()))
    }

    /// Number of configured sources
    pub fn source_count(&self) -> usize {
        self.pollers.len()
    }

    /// Spawn one poll task per source
    ///
    /// The tasks stop at their next wait once `cancel` fires.
    pub fn spawn(&self, cancel: &CancellationToken) -> JoinSet<()> {
        let mut tasks = JoinSet::new();
        for poller in &self.pollers {
            tasks.spawn(poller.clone().run(cancel.child_token()));
        }
        tasks
    }

    /// Run the pollers until `cancel` fires, then drain them
    ///
    /// Pollers still busy after the drain timeout (a fetch that ignores its
    /// bound) are aborted.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let mut tasks = self.spawn(&cancel);
        info!("Started {} poll task(s)", tasks.len());

        cancel.cancelled().await;
        info!("Shutdown signal received, draining poll tasks");

        let drained = tokio::time::timeout(self.drain_timeout, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    error!("Poll task failed: {}", e);
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "{} poll task(s) still running after {:?}, aborting",
                tasks.len(),
                self.drain_timeout
            );
            tasks.shutdown().await;
        }

        info!("All poll tasks stopped");
        Ok(())
    }
}
