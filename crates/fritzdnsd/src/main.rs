// # fritzdnsd - router host list daemon
//
// A thin integration layer over fritzdns-core. It only:
// 1. Reads configuration from the environment and a JSON file
// 2. Initializes logging and the runtime
// 3. Registers inventory backends
// 4. Runs the engine until SIGTERM or SIGINT
//
// Resolution, dedup and polling logic all live in fritzdns-core.
//
// ## Configuration
//
// - `FRITZDNS_CONFIG`: Path to the JSON engine configuration (required)
// - `FRITZDNS_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
// - `FRITZDNS_POLL_INTERVAL`: Overrides the poll interval, 10 to 3600 seconds
//
// ## Example
//
// ```bash
// cat > /etc/fritzdns.json <<'EOF'
// {
//   "inventory": { "type": "file" },
//   "sources": [
//     { "address": "/var/lib/fritzdns/home.json", "domain": "home.arpa" }
//   ]
// }
// EOF
//
// export FRITZDNS_CONFIG=/etc/fritzdns.json
// fritzdnsd
// ```

use anyhow::{Context, Result};
use fritzdns_core::{DnsConfig, DnsEngine, InventoryRegistry, PollEvent};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon settings from the environment
struct Settings {
    config_path: PathBuf,
    poll_interval: Option<u64>,
    log_level: String,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        let config_path = env::var("FRITZDNS_CONFIG").context(
            "FRITZDNS_CONFIG is required. \
            Set it via: export FRITZDNS_CONFIG=/etc/fritzdns.json",
        )?;

        let poll_interval = match env::var("FRITZDNS_POLL_INTERVAL") {
            Ok(raw) => Some(raw.trim().parse().with_context(|| {
                format!("FRITZDNS_POLL_INTERVAL must be a number of seconds. Got: {}", raw)
            })?),
            Err(_) => None,
        };

        Ok(Self {
            config_path: PathBuf::from(config_path),
            poll_interval,
            log_level: env::var("FRITZDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the settings
    fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            anyhow::bail!("FRITZDNS_CONFIG cannot be empty");
        }

        if !self.config_path.is_file() {
            anyhow::bail!(
                "FRITZDNS_CONFIG does not point to a file: {}",
                self.config_path.display()
            );
        }

        if let Some(interval) = self.poll_interval
            && !(10..=3600).contains(&interval)
        {
            anyhow::bail!(
                "FRITZDNS_POLL_INTERVAL must be between 10 and 3600 seconds. Got: {}",
                interval
            );
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "FRITZDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Read the engine configuration and apply overrides
    fn load_engine_config(&self) -> Result<DnsConfig> {
        let raw = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read {}", self.config_path.display()))?;
        let mut config: DnsConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.config_path.display()))?;

        if let Some(interval) = self.poll_interval {
            config.poller.interval_secs = interval;
        }

        config.normalize();
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    if let Err(e) = settings.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DaemonExitCode::ConfigError.into();
    }

    let config = match settings.load_engine_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let log_level = settings.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting fritzdnsd daemon");
    info!(
        "Configuration loaded: {} source(s), polling every {}s",
        config.sources.len(),
        config.poller.interval_secs
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let registry = InventoryRegistry::with_builtins();
        let (engine, events) = match DnsEngine::new(config, &registry) {
            Ok(parts) => parts,
            Err(e) => {
                error!("Failed to start engine: {}", e);
                return DaemonExitCode::ConfigError;
            }
        };

        match run_daemon(engine, events).await {
            Ok(()) => DaemonExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DaemonExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run the engine until a shutdown signal arrives
async fn run_daemon(engine: DnsEngine, events: mpsc::Receiver<PollEvent>) -> Result<()> {
    let cancel = CancellationToken::new();
    let event_logger = tokio::spawn(log_events(events));

    let responder = engine.responder();
    for domain in responder.domains() {
        info!("Serving {}", domain);
    }

    let engine_task = tokio::spawn({
        let cancel = cancel.clone();
        async move { engine.run(cancel).await }
    });

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);
    cancel.cancel();

    engine_task.await.context("Engine task panicked")??;

    // Senders are gone with the engine, so the logger sees the channel close
    if let Err(e) = event_logger.await {
        warn!("Event logger failed: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Log poll events until every poller is gone
async fn log_events(mut events: mpsc::Receiver<PollEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            PollEvent::Refreshed {
                domain,
                hosts,
                records,
            } => debug!("{}: {} host(s) from {} record(s)", domain, hosts, records),
            PollEvent::FetchFailed { domain, .. } => {
                warn!("{}: serving the last known host list", domain)
            }
            PollEvent::Started { domain } => debug!("{}: poll task started", domain),
            PollEvent::Stopped { domain } => debug!("{}: poll task stopped", domain),
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
