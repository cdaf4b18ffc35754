mod analysis;
mod bus;
mod config;
mod data;
mod engine;
mod error;
mod events;
mod feeds;
mod monitors;
mod pipeline;

use bus::EventBus;
use config::AppConfig;
use data::store::SymbolStore;
use events::{Event, EventPayload, EventPriority};
use feeds::{LogSink, SimFeed};
use monitors::{NewsMonitor, PriceMonitor};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting SignalBox...");

    // A malformed config file is fatal; a missing one falls back to defaults
    // so development runs work out of the box.
    let config = if Path::new("config.yaml").exists() {
        AppConfig::load()?
    } else {
        info!("config.yaml not found, using default configuration");
        AppConfig::default()
    };
    info!("Loaded configuration: {:?}", config);

    let bus = EventBus::new(Duration::from_secs(config.bus.drain_timeout_secs));
    let store = SymbolStore::new(config.history_limit);
    let sink = Arc::new(LogSink);

    pipeline::register_pipeline(&bus, &store, &config, sink);
    bus.start()?;

    bus.publish(Event::new(
        EventPayload::StatusUpdate {
            status: "startup".to_string(),
            message: "Options signal pipeline started".to_string(),
        },
        EventPriority::Low,
        "main",
    ));

    // Development feed; a production build swaps in real collaborators
    // behind the same traits.
    let feed = Arc::new(SimFeed::new());

    // Seed the rolling windows so analysis has something to chew on.
    use feeds::MarketDataSource;
    for symbol in &config.symbols {
        for point in feed.history(symbol, config.history_limit).await {
            store.record_price(symbol, point);
        }
    }

    let price_monitor = PriceMonitor::new(
        feed.clone(),
        bus.clone(),
        Duration::from_secs(config.scan_interval_secs),
    );
    let news_monitor = NewsMonitor::new(
        feed,
        bus.clone(),
        Duration::from_secs(config.news_interval_secs),
    );
    price_monitor.start(config.symbols.clone());
    news_monitor.start(config.symbols.clone());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    bus.publish(Event::new(
        EventPayload::StatusUpdate {
            status: "shutdown".to_string(),
            message: "Options signal pipeline stopping".to_string(),
        },
        EventPriority::Low,
        "main",
    ));

    price_monitor.stop();
    news_monitor.stop();
    if let Err(e) = bus.stop().await {
        error!("Event bus shutdown incomplete: {}", e);
    }

    Ok(())
}
