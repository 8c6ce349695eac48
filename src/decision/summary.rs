//! Aggregate view over a window of decisions.

#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};

use super::AutoScalingDecision;
use crate::oracle::ScalingAction;

/// Counts and rates over a set of decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionSummary {
    /// Decisions in the window.
    pub total: u64,
    /// Scale-up decisions.
    pub scale_up: u64,
    /// Scale-down decisions.
    pub scale_down: u64,
    /// Maintain decisions.
    pub maintain: u64,
    /// Decisions answered by the fallback rules.
    pub fallback: u64,
    /// Decisions whose execution failed.
    pub failed_executions: u64,
    /// Decisions below the confidence threshold (not executed).
    pub gated: u64,
    /// Mean confidence, 0.0 for an empty window.
    pub average_confidence: f64,
}

impl DecisionSummary {
    /// Summarise `decisions` against `confidence_threshold`.
    #[must_use]
    pub fn from_decisions(decisions: &[AutoScalingDecision], confidence_threshold: f64) -> Self {
        let mut summary = Self::default();
        let mut confidence_sum = 0.0;

        for decision in decisions {
            summary.total += 1;
            match decision.action_taken {
                ScalingAction::ScaleUp => summary.scale_up += 1,
                ScalingAction::ScaleDown => summary.scale_down += 1,
                ScalingAction::Maintain => summary.maintain += 1,
            }
            if decision.used_fallback() {
                summary.fallback += 1;
            }
            if !decision.execution_success {
                summary.failed_executions += 1;
            }
            if decision.confidence < confidence_threshold {
                summary.gated += 1;
            }
            confidence_sum += decision.confidence;
        }

        if summary.total > 0 {
            summary.average_confidence = confidence_sum / summary.total as f64;
        }
        summary
    }

    /// Share of decisions answered by the fallback, 0.0 for an empty window.
    ///
    /// A rate near 1.0 means the prediction service has been unreachable
    /// for the whole window.
    #[must_use]
    pub fn fallback_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.fallback as f64 / self.total as f64
        }
    }
}
