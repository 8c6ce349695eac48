//! Component wiring.
//!
//! Backend and history selection happen once here; nothing downstream
//! branches on configuration.

use std::sync::Arc;

use crate::backend::{HttpScalingBackend, SimulatedBackend};
use crate::collector::{MetricCollector, RingBufferHistory};
use crate::config::{Config, HistoryBackend};
use crate::controller::AutoScalingController;
use crate::decision::DecisionLog;
use crate::error::{AppError, ConfigError};
use crate::executor::ScalingExecutor;
use crate::instance::InstanceCountStore;
use crate::monitoring::PrometheusClient;
use crate::oracle::{HttpPredictionClient, PredictionOracle};
use crate::storage::SqliteStorage;
use crate::traits::{HistoryStore, ScalingBackend, TimeProvider};

/// Build a controller from configuration.
///
/// # Errors
///
/// Returns [`AppError`] if an HTTP client cannot be created, or
/// [`ConfigError::MissingRequired`] if the external backend is selected
/// without a URL.
pub fn build_controller(
    config: &Config,
    storage: Arc<SqliteStorage>,
    clock: Arc<dyn TimeProvider>,
) -> Result<AutoScalingController, AppError> {
    let timeout_ms = config.request_timeout_ms;

    let (backend, instances): (Arc<dyn ScalingBackend>, InstanceCountStore) =
        if config.scaling.use_external_backend {
            let url = config
                .scaling_backend_url
                .as_deref()
                .ok_or_else(|| ConfigError::MissingRequired {
                    var: "SCALING_BACKEND_URL".into(),
                })?;
            let backend: Arc<dyn ScalingBackend> = Arc::new(HttpScalingBackend::new(url, timeout_ms)?);
            (backend.clone(), InstanceCountStore::External(backend))
        } else {
            let backend: Arc<dyn ScalingBackend> = Arc::new(SimulatedBackend::new());
            (backend, InstanceCountStore::Local(storage.clone()))
        };

    let history: Arc<dyn HistoryStore> = match config.history_backend {
        HistoryBackend::Sqlite => storage.clone(),
        HistoryBackend::Memory => Arc::new(RingBufferHistory::default()),
    };

    let collector = MetricCollector::new(
        Arc::new(PrometheusClient::new(&config.prometheus_url, timeout_ms)?),
        instances.clone(),
        history,
        clock.clone(),
        config.workload.clone(),
        &config.scaling.metrics_window,
    );
    let oracle = PredictionOracle::new(
        Arc::new(HttpPredictionClient::new(
            &config.prediction_service_url,
            timeout_ms,
            clock.clone(),
        )?),
        clock.clone(),
    );
    let executor = ScalingExecutor::new(
        backend,
        instances.clone(),
        config.scaling.min_instances,
        config.scaling.max_instances,
    );
    let log = DecisionLog::new(storage, clock.clone());

    tracing::info!(
        backend = executor.backend_name(),
        history = ?config.history_backend,
        min_instances = config.scaling.min_instances,
        max_instances = config.scaling.max_instances,
        confidence_threshold = config.scaling.confidence_threshold,
        "Controller assembled"
    );

    Ok(AutoScalingController::new(
        collector,
        oracle,
        executor,
        log,
        instances,
        clock,
        config.scaling.clone(),
    ))
}
