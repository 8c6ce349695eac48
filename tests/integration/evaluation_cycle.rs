//! End-to-end evaluation cycles against mock services.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use chrono::Duration;
use ml_autoscaler::collector::MetricField;
use ml_autoscaler::controller::CycleStatus;
use ml_autoscaler::oracle::{PredictionSource, ScalingAction};
use pretty_assertions::assert_eq;
use serial_test::serial;
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

use super::common::Harness;

#[tokio::test]
#[serial]
async fn test_oracle_down_fallback_is_gated() {
    let harness = Harness::start().await;
    harness.storage.set_instance_count(2).await.unwrap();
    harness.serve_metric(MetricField::CpuUsage, 90.0).await;
    harness.serve_no_data().await;
    harness.oracle_down().await;

    let controller = harness.controller(&harness.config());

    let status = controller.tick().await;
    let report = status.report().expect("cycle should complete");
    assert_eq!(report.action, ScalingAction::ScaleUp);
    assert_eq!(report.confidence, 0.6);
    assert!(report.used_fallback);
    assert!(report.gated);
    assert_eq!(controller.current_instance_count().await, 2);

    let decisions = controller.recent_decisions(Duration::hours(1)).await.unwrap();
    assert_eq!(decisions.len(), 1);
    let decision = &decisions[0];
    assert_eq!(decision.action_taken, ScalingAction::ScaleUp);
    assert!(decision.execution_success);
    assert_eq!(decision.prediction.produced_by, PredictionSource::Fallback);
    assert_eq!(decision.snapshot.cpu_usage, 90.0);
    assert_eq!(decision.snapshot.current_instances, 2);
}

#[tokio::test]
#[serial]
async fn test_confident_scale_up_with_simulated_backend() {
    let harness = Harness::start().await;
    harness.storage.set_instance_count(5).await.unwrap();
    harness.serve_no_data().await;
    harness.oracle_answers("scale_up", 0.9).await;

    let controller = harness.controller(&harness.config());

    let report = controller.tick().await.report().cloned().unwrap();
    assert!(!report.gated);
    assert!(report.outcome.success);
    assert_eq!(report.outcome.previous_count, 5);
    assert_eq!(report.outcome.new_count, 6);
    assert_eq!(controller.current_instance_count().await, 6);

    let latest = controller.latest_decisions(10).await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].action_taken, ScalingAction::ScaleUp);
    assert!(latest[0].execution_success);
    assert!(!latest[0].used_external_backend);
}

#[tokio::test]
#[serial]
async fn test_gated_scale_up_leaves_register_unwritten() {
    let harness = Harness::start().await;
    harness.serve_metric(MetricField::CpuUsage, 95.0).await;
    harness.serve_no_data().await;
    harness.oracle_answers("scale_up", 0.5).await;

    let controller = harness.controller(&harness.config());
    let report = controller.tick().await.report().cloned().unwrap();

    assert!(report.gated);
    assert_eq!(report.action, ScalingAction::ScaleUp);
    assert_eq!(harness.storage.get_instance_count().await.unwrap(), None);
    assert_eq!(controller.current_instance_count().await, 1);
}

#[tokio::test]
#[serial]
async fn test_every_completed_cycle_records_one_decision() {
    let harness = Harness::start().await;
    harness.serve_no_data().await;
    harness.oracle_answers("maintain", 0.95).await;

    let controller = harness.controller(&harness.config());

    for _ in 0..3 {
        assert!(matches!(controller.tick().await, CycleStatus::Completed(_)));
    }
    controller.set_enabled(false);
    assert_eq!(controller.tick().await, CycleStatus::SkippedDisabled);

    let decisions = controller.recent_decisions(Duration::hours(1)).await.unwrap();
    assert_eq!(decisions.len(), 3);
    assert!(decisions
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
}

#[tokio::test]
#[serial]
async fn test_scale_up_at_maximum_is_noop() {
    let harness = Harness::start().await;
    harness.storage.set_instance_count(10).await.unwrap();
    harness.serve_no_data().await;
    harness.oracle_answers("scale_up", 0.99).await;

    let controller = harness.controller(&harness.config());

    let report = controller.tick().await.report().cloned().unwrap();
    assert!(report.outcome.success);
    assert!(!report.outcome.changed());
    assert_eq!(controller.current_instance_count().await, 10);
}

#[tokio::test]
#[serial]
async fn test_history_feeds_next_cycle() {
    let harness = Harness::start().await;
    harness.serve_metric(MetricField::CpuUsage, 42.0).await;
    harness.serve_no_data().await;
    harness.oracle_answers("maintain", 0.9).await;

    let controller = harness.controller(&harness.config());

    let first = controller.tick().await;
    assert!(first.report().is_some());
    let second = controller.tick().await;
    assert!(second.report().is_some());

    let decisions = controller.recent_decisions(Duration::hours(1)).await.unwrap();
    assert_eq!(decisions[0].snapshot.cpu_usage_1h_avg, 0.3);
    assert_eq!(decisions[1].snapshot.cpu_usage_1h_avg, 42.0);
}

#[tokio::test]
#[serial]
async fn test_monitoring_outage_does_not_skew_history() {
    let harness = Harness::start().await;
    harness.serve_metric(MetricField::CpuUsage, 90.0).await;
    harness.serve_no_data().await;
    harness.oracle_answers("maintain", 0.9).await;

    let controller = harness.controller(&harness.config());
    assert!(controller.tick().await.report().is_some());

    harness.prometheus.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.prometheus)
        .await;
    assert!(controller.tick().await.report().is_some());

    harness.prometheus.reset().await;
    harness.serve_metric(MetricField::CpuUsage, 90.0).await;
    harness.serve_no_data().await;
    assert!(controller.tick().await.report().is_some());

    let decisions = controller.recent_decisions(Duration::hours(1)).await.unwrap();
    assert_eq!(decisions.len(), 3);
    assert_eq!(decisions[1].snapshot.cpu_usage, 0.3);
    assert_eq!(decisions[1].snapshot.cpu_usage_1h_avg, 90.0);
    assert_eq!(decisions[2].snapshot.cpu_usage_1h_avg, 90.0);
}

#[tokio::test]
#[serial]
async fn test_summary_reports_degradation() {
    let harness = Harness::start().await;
    harness.serve_no_data().await;
    harness.oracle_down().await;

    let controller = harness.controller(&harness.config());

    controller.tick().await;
    controller.tick().await;

    let summary = controller.decision_summary(Duration::hours(1)).await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.fallback, 2);
    assert_eq!(summary.fallback_rate(), 1.0);
    assert_eq!(summary.gated, 2);
}

#[tokio::test]
#[serial]
async fn test_preview_records_nothing() {
    let harness = Harness::start().await;
    harness.serve_metric(MetricField::MemoryUsage, 95.0).await;
    harness.serve_no_data().await;
    harness.oracle_down().await;

    let controller = harness.controller(&harness.config());

    let preview = controller.preview().await;
    assert_eq!(preview.prediction.action, ScalingAction::ScaleUp);
    assert!(!preview.meets_threshold);
    assert!(controller.latest_decisions(10).await.unwrap().is_empty());
}
