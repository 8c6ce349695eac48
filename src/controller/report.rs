//! Cycle results returned by the controller.

use serde::Serialize;
use uuid::Uuid;

use crate::collector::MetricSnapshot;
use crate::executor::ExecutionOutcome;
use crate::oracle::{ScalingAction, ScalingPrediction};

/// What one completed cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Correlation id, also attached to the cycle's log span.
    pub cycle_id: Uuid,
    /// Row id of the recorded decision.
    pub decision_id: i64,
    /// Predicted action.
    pub action: ScalingAction,
    /// Prediction confidence.
    pub confidence: f64,
    /// Whether the fallback rules answered.
    pub used_fallback: bool,
    /// Whether the confidence gate blocked execution.
    pub gated: bool,
    /// Execution result (a no-op success when gated).
    pub outcome: ExecutionOutcome,
}

/// Result of [`tick`](super::AutoScalingController::tick).
#[derive(Debug, Clone, PartialEq)]
pub enum CycleStatus {
    /// Autoscaling is switched off.
    SkippedDisabled,
    /// Another cycle was still running.
    SkippedInFlight,
    /// The cycle ran and its decision was recorded.
    Completed(CycleReport),
    /// The cycle aborted; nothing was recorded.
    Failed {
        /// Correlation id.
        cycle_id: Uuid,
        /// Error description.
        message: String,
    },
}

impl CycleStatus {
    /// The report, if the cycle completed.
    #[must_use]
    pub const fn report(&self) -> Option<&CycleReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Answer to an out-of-schedule evaluation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationAck {
    /// Whether a cycle was scheduled.
    pub accepted: bool,
    /// Human-readable status.
    pub message: String,
}

impl EvaluationAck {
    pub(crate) fn accepted() -> Self {
        Self {
            accepted: true,
            message: "Evaluation scheduled".to_string(),
        }
    }

    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            message: message.into(),
        }
    }
}

/// Dry-run result: what the oracle would say right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationPreview {
    /// Freshly collected telemetry.
    pub snapshot: MetricSnapshot,
    /// Oracle answer for it.
    pub prediction: ScalingPrediction,
    /// Whether the prediction clears the confidence threshold.
    pub meets_threshold: bool,
}
