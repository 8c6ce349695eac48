//! Degraded dependencies and recovery.
//!
//! Every outage below must still end in a completed cycle with one decision.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use ml_autoscaler::oracle::{CircuitState, PredictionSource, PREDICT_PATH};
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use super::common::Harness;

#[tokio::test]
#[serial]
async fn test_monitoring_outage_uses_defaults() {
    let harness = Harness::start().await;
    harness.oracle_answers("maintain", 0.9).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(Harness::queries_per_snapshot() as u64)
        .mount(&harness.prometheus)
        .await;

    let controller = harness.controller(&harness.config());
    let report = controller.tick().await.report().cloned().unwrap();
    assert!(!report.used_fallback);

    let decision = &controller.latest_decisions(1).await.unwrap()[0];
    assert_eq!(decision.snapshot.cpu_usage, 0.3);
    assert_eq!(decision.snapshot.memory_usage, 0.3);
    assert_eq!(decision.snapshot.requests_per_second, 10.0);
    assert_eq!(decision.snapshot.response_time_ms, 100.0);
    assert_eq!(decision.snapshot.disk_io_iops, 1.0);
}

#[tokio::test]
#[serial]
async fn test_unreachable_monitoring_completes_cycle() {
    let harness = Harness::start().await;
    harness.oracle_answers("maintain", 0.9).await;

    let mut config = harness.config();
    config.prometheus_url = "http://127.0.0.1:9".to_string();
    let controller = harness.controller(&config);

    assert!(controller.tick().await.report().is_some());
    assert_eq!(controller.latest_decisions(10).await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_malformed_prediction_falls_back() {
    let harness = Harness::start().await;
    harness.serve_no_data().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&harness.oracle)
        .await;

    let controller = harness.controller(&harness.config());
    let report = controller.tick().await.report().cloned().unwrap();

    assert!(report.used_fallback);
    assert_eq!(report.confidence, 0.6);
}

#[tokio::test]
#[serial]
async fn test_unknown_action_falls_back() {
    let harness = Harness::start().await;
    harness.serve_no_data().await;
    harness.oracle_answers("scale_sideways", 0.99).await;

    let controller = harness.controller(&harness.config());
    controller.tick().await;

    let decision = &controller.latest_decisions(1).await.unwrap()[0];
    assert_eq!(decision.prediction.produced_by, PredictionSource::Fallback);
}

#[tokio::test]
#[serial]
async fn test_out_of_range_confidence_falls_back() {
    let harness = Harness::start().await;
    harness.serve_no_data().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"action": "scale_up", "confidence": 1.7})),
        )
        .mount(&harness.oracle)
        .await;

    let controller = harness.controller(&harness.config());
    let report = controller.tick().await.report().cloned().unwrap();
    assert!(report.used_fallback);
}

#[tokio::test]
#[serial]
async fn test_repeated_oracle_failures_open_circuit() {
    let harness = Harness::start().await;
    harness.serve_no_data().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&harness.oracle)
        .await;

    let controller = harness.controller(&harness.config());
    for _ in 0..5 {
        let report = controller.tick().await.report().cloned().unwrap();
        assert!(report.used_fallback);
    }

    assert_eq!(controller.oracle_circuit_state(), CircuitState::Open);
    assert_eq!(controller.latest_decisions(10).await.unwrap().len(), 5);
}

#[tokio::test]
#[serial]
async fn test_slow_oracle_times_out_to_fallback() {
    let harness = Harness::start().await;
    harness.serve_no_data().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"action": "scale_up", "confidence": 0.99}))
                .set_delay(std::time::Duration::from_millis(800)),
        )
        .mount(&harness.oracle)
        .await;

    let mut config = harness.config();
    config.request_timeout_ms = 200;
    let controller = harness.controller(&config);

    let report = controller.tick().await.report().cloned().unwrap();
    assert!(report.used_fallback);
}
