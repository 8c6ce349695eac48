//! Deterministic rule table used when the prediction service is unavailable.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::types::{PredictionSource, ScalingAction, ScalingPrediction};
use crate::collector::MetricSnapshot;

/// Confidence attached to every fallback prediction.
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

/// CPU percentage above which the fallback scales up.
pub const SCALE_UP_CPU: f64 = 80.0;
/// Memory percentage above which the fallback scales up.
pub const SCALE_UP_MEMORY: f64 = 85.0;
/// Response time (ms) above which the fallback scales up.
pub const SCALE_UP_RESPONSE_MS: f64 = 500.0;
/// CPU percentage below which the fallback may scale down.
pub const SCALE_DOWN_CPU: f64 = 20.0;
/// Memory percentage below which the fallback may scale down.
pub const SCALE_DOWN_MEMORY: f64 = 30.0;

/// Pick an action from the rule table.
#[must_use]
pub fn fallback_action(snapshot: &MetricSnapshot) -> ScalingAction {
    if snapshot.cpu_usage > SCALE_UP_CPU
        || snapshot.memory_usage > SCALE_UP_MEMORY
        || snapshot.response_time_ms > SCALE_UP_RESPONSE_MS
    {
        ScalingAction::ScaleUp
    } else if snapshot.cpu_usage < SCALE_DOWN_CPU
        && snapshot.memory_usage < SCALE_DOWN_MEMORY
        && snapshot.current_instances > 1
    {
        ScalingAction::ScaleDown
    } else {
        ScalingAction::Maintain
    }
}

/// Build the fallback prediction for `snapshot`.
///
/// The chosen action carries 0.6; for scale actions the remaining 0.4 goes
/// to `maintain`, for `maintain` it is split across the two scale actions.
#[must_use]
pub fn fallback_prediction(snapshot: &MetricSnapshot, now: DateTime<Utc>) -> ScalingPrediction {
    let action = fallback_action(snapshot);
    let rest = 1.0 - FALLBACK_CONFIDENCE;

    let mut probabilities = BTreeMap::new();
    probabilities.insert(action.as_str().to_string(), FALLBACK_CONFIDENCE);
    if action == ScalingAction::Maintain {
        probabilities.insert(ScalingAction::ScaleUp.as_str().to_string(), rest / 2.0);
        probabilities.insert(ScalingAction::ScaleDown.as_str().to_string(), rest / 2.0);
    } else {
        probabilities.insert(ScalingAction::Maintain.as_str().to_string(), rest);
    }

    ScalingPrediction {
        action,
        confidence: FALLBACK_CONFIDENCE,
        probabilities,
        produced_by: PredictionSource::Fallback,
        timestamp: now,
    }
}
