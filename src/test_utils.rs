//! Test fixtures and factories.
//!
//! Only compiled for tests (`#[cfg(test)]`).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};

use crate::collector::MetricSnapshot;
use crate::decision::AutoScalingDecision;
use crate::oracle::{fallback_prediction, PredictionSource, ScalingAction, ScalingPrediction};

/// Monday 2025-01-06 12:00:00 UTC.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap()
}

/// A snapshot with the given load and count; everything else at defaults.
#[must_use]
pub fn snapshot(cpu: f64, memory: f64, rps: f64, current_instances: u32) -> MetricSnapshot {
    MetricSnapshot {
        cpu_usage: cpu,
        memory_usage: memory,
        requests_per_second: rps,
        response_time_ms: 100.0,
        network_in_mbps: 1.0,
        network_out_mbps: 1.0,
        hour: 12,
        day_of_week: 1,
        is_weekend: false,
        is_business_hours: true,
        app_id: 1,
        app_type: "web".to_string(),
        queue_length: 0,
        active_connections: 10,
        allocated_cpu_cores: 2,
        allocated_memory_gb: 4,
        current_instances,
        cpu_usage_1h_avg: cpu,
        cpu_usage_4h_avg: cpu,
        cpu_usage_24h_avg: cpu,
        memory_usage_1h_avg: memory,
        requests_1h_avg: rps,
        disk_io_iops: crate::collector::estimate_disk_iops(rps),
    }
}

/// An oracle-produced decision at `timestamp`.
#[must_use]
pub fn decision_at(
    action: ScalingAction,
    confidence: f64,
    execution_success: bool,
    timestamp: DateTime<Utc>,
) -> AutoScalingDecision {
    let mut probabilities = BTreeMap::new();
    probabilities.insert(action.as_str().to_string(), confidence);
    let prediction = ScalingPrediction::new(
        action,
        confidence,
        probabilities,
        PredictionSource::Oracle,
        timestamp,
    )
    .unwrap();

    AutoScalingDecision::new(
        snapshot(50.0, 50.0, 100.0, 2),
        prediction,
        timestamp,
        execution_success,
        false,
    )
}

/// An oracle-produced decision at [`fixed_now`].
#[must_use]
pub fn decision(
    action: ScalingAction,
    confidence: f64,
    execution_success: bool,
) -> AutoScalingDecision {
    decision_at(action, confidence, execution_success, fixed_now())
}

/// A fallback decision whose snapshot produces `action`.
#[must_use]
pub fn fallback_decision(action: ScalingAction) -> AutoScalingDecision {
    let s = match action {
        ScalingAction::ScaleUp => snapshot(95.0, 50.0, 100.0, 2),
        ScalingAction::ScaleDown => snapshot(5.0, 10.0, 100.0, 3),
        ScalingAction::Maintain => snapshot(50.0, 50.0, 100.0, 2),
    };
    let prediction = fallback_prediction(&s, fixed_now());
    assert_eq!(prediction.action, action);
    AutoScalingDecision::new(s, prediction, fixed_now(), true, false)
}
