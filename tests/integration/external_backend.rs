//! Cycles driving an HTTP control plane.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ml_autoscaler::collector::MetricField;
use ml_autoscaler::oracle::ScalingAction;
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use super::common::Harness;

#[tokio::test]
#[serial]
async fn test_external_scale_up_uses_control_plane_count() {
    let harness = Harness::start().await;
    harness.serve_no_data().await;
    harness.oracle_answers("scale_up", 0.9).await;
    harness.control_plane_reports(5).await;
    Mock::given(method("POST"))
        .and(path("/scale"))
        .and(body_json(json!({"target": 6})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&harness.control_plane)
        .await;

    let controller = harness.controller(&harness.external_config());
    let report = controller.tick().await.report().cloned().unwrap();

    assert_eq!(report.action, ScalingAction::ScaleUp);
    assert!(report.outcome.success);
    assert_eq!(report.outcome.previous_count, 5);
    assert_eq!(report.outcome.new_count, 6);

    let latest = controller.latest_decisions(1).await.unwrap();
    assert!(latest[0].used_external_backend);
    assert_eq!(latest[0].snapshot.current_instances, 5);

    // The control plane owns the count; the local register stays untouched.
    assert_eq!(harness.storage.get_instance_count().await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn test_gated_cycle_never_calls_control_plane() {
    let harness = Harness::start().await;
    harness.serve_metric(MetricField::CpuUsage, 90.0).await;
    harness.serve_no_data().await;
    harness.oracle_down().await;
    harness.control_plane_reports(2).await;
    Mock::given(method("POST"))
        .and(path("/scale"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.control_plane)
        .await;

    let controller = harness.controller(&harness.external_config());
    let report = controller.tick().await.report().cloned().unwrap();

    assert!(report.gated);
    assert!(report.used_fallback);
    assert_eq!(report.outcome.new_count, 2);
}

#[tokio::test]
#[serial]
async fn test_refused_scale_is_recorded_as_failure() {
    let harness = Harness::start().await;
    harness.serve_no_data().await;
    harness.oracle_answers("scale_down", 0.8).await;
    harness.control_plane_reports(4).await;
    Mock::given(method("POST"))
        .and(path("/scale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .expect(1)
        .mount(&harness.control_plane)
        .await;

    let controller = harness.controller(&harness.external_config());
    let report = controller.tick().await.report().cloned().unwrap();

    assert!(!report.outcome.success);
    assert_eq!(report.outcome.new_count, 4);

    let latest = controller.latest_decisions(1).await.unwrap();
    assert_eq!(latest[0].action_taken, ScalingAction::ScaleDown);
    assert!(!latest[0].execution_success);
}

#[tokio::test]
#[serial]
async fn test_control_plane_outage_defaults_count() {
    let harness = Harness::start().await;
    harness.serve_no_data().await;
    harness.oracle_answers("maintain", 0.9).await;
    Mock::given(method("GET"))
        .and(path("/instances"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.control_plane)
        .await;

    let controller = harness.controller(&harness.external_config());
    assert_eq!(controller.current_instance_count().await, 1);

    let report = controller.tick().await.report().cloned().unwrap();
    assert_eq!(report.outcome.previous_count, 1);
    assert!(report.outcome.success);
}
