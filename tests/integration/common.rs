//! Shared fixtures: mock Prometheus, oracle and control plane servers plus
//! an on-disk database.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::sync::Arc;

use ml_autoscaler::app::build_controller;
use ml_autoscaler::collector::{MetricField, POLICY};
use ml_autoscaler::config::{Config, HistoryBackend, ScalingConfig, WorkloadProfile};
use ml_autoscaler::controller::AutoScalingController;
use ml_autoscaler::monitoring::QUERY_PATH;
use ml_autoscaler::oracle::PREDICT_PATH;
use ml_autoscaler::storage::SqliteStorage;
use ml_autoscaler::traits::RealTimeProvider;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Running mock services and a database.
pub struct Harness {
    pub prometheus: MockServer,
    pub oracle: MockServer,
    pub control_plane: MockServer,
    pub storage: Arc<SqliteStorage>,
    pub temp_dir: TempDir,
}

impl Harness {
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = SqliteStorage::new(temp_dir.path().join("autoscaler.db"))
            .await
            .expect("Failed to create storage");

        Self {
            prometheus: MockServer::start().await,
            oracle: MockServer::start().await,
            control_plane: MockServer::start().await,
            storage: Arc::new(storage),
            temp_dir,
        }
    }

    pub fn config(&self) -> Config {
        Config {
            database_path: self
                .temp_dir
                .path()
                .join("autoscaler.db")
                .display()
                .to_string(),
            log_level: "debug".to_string(),
            prometheus_url: self.prometheus.uri(),
            prediction_service_url: self.oracle.uri(),
            scaling_backend_url: None,
            request_timeout_ms: 2_000,
            evaluation_interval_secs: 60,
            history_backend: HistoryBackend::Sqlite,
            workload: WorkloadProfile::default(),
            scaling: ScalingConfig::default(),
        }
    }

    /// Configuration that drives the mock control plane.
    pub fn external_config(&self) -> Config {
        let mut config = self.config();
        config.scaling_backend_url = Some(self.control_plane.uri());
        config.scaling.use_external_backend = true;
        config
    }

    pub fn controller(&self, config: &Config) -> AutoScalingController {
        build_controller(config, self.storage.clone(), Arc::new(RealTimeProvider))
            .expect("Failed to build controller")
    }

    /// Serve `value` for `field`; every other query returns an empty vector.
    pub async fn serve_metric(&self, field: MetricField, value: f64) {
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .and(query_param("query", field.query("5m")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": {
                    "resultType": "vector",
                    "result": [{"metric": {}, "value": [1_736_164_800, value.to_string()]}]
                }
            })))
            .mount(&self.prometheus)
            .await;
    }

    /// Answer every remaining query with an empty result.
    pub async fn serve_no_data(&self) {
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": {"resultType": "vector", "result": []}
            })))
            .mount(&self.prometheus)
            .await;
    }

    pub async fn oracle_down(&self) {
        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.oracle)
            .await;
    }

    pub async fn oracle_answers(&self, action: &str, confidence: f64) {
        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "action": action,
                "confidence": confidence,
                "probabilities": {action: confidence}
            })))
            .mount(&self.oracle)
            .await;
    }

    /// Report `count` running instances from the control plane.
    pub async fn control_plane_reports(&self, count: u32) {
        Mock::given(method("GET"))
            .and(path("/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": count})))
            .mount(&self.control_plane)
            .await;
    }

    /// Number of monitored fields, i.e. queries per snapshot.
    pub fn queries_per_snapshot() -> usize {
        POLICY.len()
    }
}
