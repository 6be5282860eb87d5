//! Minimal embedding example for fritzdns-core
//!
//! Two LANs are served from in-memory host lists. The application owns the
//! engine lifecycle and asks the responder directly, the way a DNS server
//! plugin would.

use fritzdns_core::config::{InventoryConfig, SourceConfig};
use fritzdns_core::responder::{Outcome, Query, RecordType};
use fritzdns_core::traits::{HostInventory, InventoryFactory, RawHostRecord};
use fritzdns_core::{DnsConfig, DnsEngine, Error, InventoryRegistry, PollEvent, Result, StaticInventory};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Hands each source the in-memory list registered for its address
struct EmbeddedFactory {
    lists: HashMap<String, StaticInventory>,
}

impl InventoryFactory for EmbeddedFactory {
    fn create(
        &self,
        _config: &InventoryConfig,
        source: &SourceConfig,
    ) -> Result<Arc<dyn HostInventory>> {
        self.lists
            .get(&source.address)
            .map(|list| Arc::new(list.clone()) as Arc<dyn HostInventory>)
            .ok_or_else(|| Error::config(format!("No host list for {}", source.address)))
    }
}

async fn next_refresh(events: &mut mpsc::Receiver<PollEvent>) {
    while let Some(event) = events.recv().await {
        println!("[Event] {:?}", event);
        if matches!(event, PollEvent::Refreshed { .. }) {
            return;
        }
    }
}

fn show(outcome: &Outcome, query: &Query) {
    match outcome {
        Outcome::Answered(response) => {
            for answer in &response.answers {
                println!(
                    "   {} -> {} {} (ttl {})",
                    query.name, answer.name, answer.addr, answer.ttl
                );
            }
        }
        Outcome::Delegate => println!("   {} -> delegated", query.name),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    println!("=== Embedded fritzdns-core Example ===\n");

    let office = StaticInventory::new(vec![
        RawHostRecord::new("printer", "10.0.0.7", true),
        RawHostRecord::new("nas", "10.0.0.20", true),
        RawHostRecord::new("PC-AA-BB-CC-11-22-33", "10.0.0.99", true),
        RawHostRecord::new("fritz.box", "10.0.0.1", true),
    ]);
    let home = StaticInventory::new(vec![RawHostRecord::new("nas", "10.0.1.20", true)]);

    let registry = InventoryRegistry::new();
    registry.register_inventory(
        "embedded",
        Box::new(EmbeddedFactory {
            lists: HashMap::from([
                ("office-router".to_string(), office.clone()),
                ("home-router".to_string(), home.clone()),
            ]),
        }),
    );

    let mut config = DnsConfig::new(vec![
        SourceConfig::new("office-router", "office.example"),
        SourceConfig::new("home-router", "home.example"),
    ]);
    config.inventory = InventoryConfig::Custom {
        factory: "embedded".to_string(),
        config: serde_json::Value::Null,
    };
    config.poller.interval_secs = 1;

    println!("1. Creating engine...");
    let (engine, mut events) = DnsEngine::new(config, &registry)?;
    let responder = engine.responder();

    println!("2. Starting poll tasks...");
    let cancel = CancellationToken::new();
    let engine_handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { engine.run(cancel).await }
    });

    next_refresh(&mut events).await;
    next_refresh(&mut events).await;

    println!("\n3. Resolving queries:");
    for query in [
        Query::a("printer"),
        Query::a("nas"),
        Query::a("nas.home.example."),
        Query::a("printer.home.example."),
        Query::a("fritz.box"),
        Query::new("printer.office.example.", RecordType::Aaaa),
    ] {
        show(&responder.resolve(&query), &query);
    }

    println!("\n4. A laptop joins the home network...");
    home.push(RawHostRecord::new("laptop", "10.0.1.40", true)).await;
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            next_refresh(&mut events).await;
            if responder.resolve(&Query::a("laptop")).answers().len() == 1 {
                break;
            }
        }
    })
    .await
    .map_err(|_| Error::Timeout(3))?;
    let query = Query::a("laptop");
    show(&responder.resolve(&query), &query);

    println!("\n5. Stopping engine...");
    cancel.cancel();
    engine_handle
        .await
        .map_err(|e| Error::Other(format!("engine task failed: {}", e)))??;

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Engine lifecycle is fully controlled by application");
    println!("- Host lists and DNS transport are plugged in from outside");
    println!("- Queries never wait on a router fetch");

    Ok(())
}
