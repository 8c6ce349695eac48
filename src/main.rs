//! ML Autoscaler binary entry point.
//!
//! Loads configuration, opens the database, wires the controller and runs
//! the evaluation loop until Ctrl-C. All logs go to stderr.

// Enable the coverage attribute when running with nightly for llvm-cov exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::sync::Arc;
use std::time::Duration;

use ml_autoscaler::app::build_controller;
use ml_autoscaler::config::Config;
use ml_autoscaler::storage::SqliteStorage;
use ml_autoscaler::traits::{RealTimeProvider, TimeProvider};
use tokio::sync::watch;

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string())
                .parse()
                .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("ml-autoscaler starting...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        database = %config.database_path,
        prometheus = %config.prometheus_url,
        oracle = %config.prediction_service_url,
        timeout_ms = config.request_timeout_ms,
        interval_secs = config.evaluation_interval_secs,
        "Configuration loaded"
    );

    let clock: Arc<dyn TimeProvider> = Arc::new(RealTimeProvider);

    let storage = match SqliteStorage::new(&config.database_path).await {
        Ok(storage) => Arc::new(storage.with_clock(clock.clone())),
        Err(e) => {
            tracing::error!("Storage error: {e}");
            std::process::exit(1);
        }
    };

    let controller = match build_controller(&config, storage, clock) {
        Ok(controller) => Arc::new(controller),
        Err(e) => {
            tracing::error!("Startup error: {e}");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let period = Duration::from_secs(config.evaluation_interval_secs);
    let loop_handle = tokio::spawn(controller.run(period, shutdown_rx));

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutdown requested, waiting for the current cycle");
    let _ = shutdown_tx.send(true);

    if let Err(e) = loop_handle.await {
        tracing::error!("Autoscaling loop ended abnormally: {e}");
    }

    tracing::info!("ml-autoscaler shutdown complete");
}
