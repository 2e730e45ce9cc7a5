//! # GPS Node
//!
//! Reads NMEA fixes from a serial GPS receiver and serves the recent
//! history over HTTP.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use gps_node::config::{Config, LoggingConfig};
use gps_node::http::{ExpositionService, StartOutcome};
use gps_node::network::{ConnectivityManager, ConnectivityState, HostTransport};
use gps_node::serial::{self, SerialReader};
use gps_node::shutdown;
use gps_node::store::CoordinateStore;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable naming the configuration file
const CONFIG_ENV: &str = "GPS_NODE_CONFIG";

/// Log file name prefix inside the configured log directory
const LOG_FILE_PREFIX: &str = "gps-node.log";

/// Main entry point for the GPS node
///
/// # Control Flow
///
/// 1. Load configuration, set up logging
/// 2. Spawn the connectivity manager (bring-up, then watchdog)
/// 3. Spawn ingestion: open the serial port (retrying), run the reader loop
/// 4. Spawn exposition: wait for the uplink, then start the HTTP service
/// 5. On Ctrl+C fire the shutdown signal and wait for every task
#[tokio::main]
async fn main() -> Result<()> {
    let (config, source) = load_config()?;
    let _log_guard = init_logging(&config.logging);

    info!("GPS node v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", source);

    let (trigger, shutdown) = shutdown::channel();
    let store = Arc::new(CoordinateStore::new(config.store.capacity));

    let manager = ConnectivityManager::new(
        HostTransport::new(config.network.probe_address.clone()),
        &config.network,
    );
    let mut link = manager.subscribe();
    let network_task = tokio::spawn(manager.run(shutdown.clone()));

    let ingest_task = {
        let store = Arc::clone(&store);
        let serial_config = config.serial.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let Some(port) = serial::open_with_retry(&serial_config, shutdown.clone()).await
            else {
                return;
            };
            let stats = SerialReader::new(port, store, &serial_config)
                .run(shutdown)
                .await;
            info!("Ingestion finished: {:?}", stats);
        })
    };

    let http_task = {
        let service = ExpositionService::new(Arc::clone(&store), config.http.clone());
        let mut shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.recv() => return,
                ready = uplink_ready(&mut link) => {
                    if !ready {
                        warn!("Connectivity manager stopped before the uplink came up");
                        return;
                    }
                }
            }

            match service.start(shutdown).await {
                Ok(StartOutcome::Started(address)) => {
                    info!("Serving GPS history at http://{}/gps", address)
                }
                Ok(StartOutcome::AlreadyRunning) => {}
                Err(e) => error!("HTTP service unavailable: {}", e),
            }
        })
    };

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");
    trigger.fire();

    let (ingest, network, http) = tokio::join!(ingest_task, network_task, http_task);
    for (name, result) in [("ingestion", ingest), ("network", network), ("http", http)] {
        if let Err(e) = result {
            error!("{} task ended abnormally: {}", name, e);
        }
    }

    info!("GPS node stopped");
    Ok(())
}

/// Wait until the uplink reports `Connected`; false if the manager is gone
async fn uplink_ready(link: &mut watch::Receiver<ConnectivityState>) -> bool {
    link.wait_for(|state| *state == ConnectivityState::Connected)
        .await
        .is_ok()
}

/// Resolve and load the configuration
///
/// An explicit path (first argument, then `GPS_NODE_CONFIG`) must exist.
/// Without one, `config/default.toml` is used if present, else built-in
/// defaults.
fn load_config() -> Result<(Config, String)> {
    let explicit = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from);

    let path = match explicit {
        Some(path) => path,
        None if PathBuf::from(DEFAULT_CONFIG_PATH).exists() => {
            PathBuf::from(DEFAULT_CONFIG_PATH)
        }
        None => return Ok((Config::default(), "built-in defaults".to_string())),
    };

    let config = Config::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok((config, path.display().to_string()))
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the configured level. With a log directory set,
/// output goes to a daily rolling file through a non-blocking writer whose
/// guard must stay alive for the life of the process.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.directory.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&config.directory, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}
