//! Krepsys server binary.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use krepsys::feed::{FeedFetcher, FeedScheduler, FeedService};
use krepsys::{Config, Database};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> krepsys::Result<()> {
    let config = match Config::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(krepsys::KrepsysError::Io(_)) => {
            // No config file: run with defaults
            Config::default()
        }
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            return Err(e);
        }
    };

    if let Err(e) = krepsys::logging::init(&config.logging) {
        eprintln!("Failed to initialize file logging: {e}");
        krepsys::logging::init_console_only(&config.logging.level);
        warn!("File logging unavailable, logging to console only");
    }

    info!("Starting Krepsys");

    let db = Arc::new(Database::open(&config.database.path).await?);
    let fetcher = Arc::new(FeedFetcher::new(&config.fetch)?);
    let service = FeedService::new(
        db.clone(),
        fetcher,
        config.fetch.default_interval_secs as i64,
    );

    let scheduler = FeedScheduler::new(
        service.clone(),
        Duration::from_secs(config.fetch.tick_interval_secs),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    // Ask the scheduler to stop and wait for the current pass to finish
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_handle.await {
        error!("Scheduler task panicked: {}", e);
    }

    info!("Krepsys stopped");
    Ok(())
}
