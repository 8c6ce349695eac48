//! Decision log.
//!
//! Every completed evaluation cycle appends exactly one
//! [`AutoScalingDecision`]. Rows are written once, after execution, and never
//! updated.

mod summary;

pub use summary::DecisionSummary;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::collector::MetricSnapshot;
use crate::error::StorageError;
use crate::oracle::{ScalingAction, ScalingPrediction};
use crate::traits::{DecisionStore, TimeProvider};

/// One evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoScalingDecision {
    /// Row id, `None` until persisted.
    pub id: Option<i64>,
    /// Input telemetry.
    pub snapshot: MetricSnapshot,
    /// Oracle output.
    pub prediction: ScalingPrediction,
    /// Action recorded for the cycle (the predicted action).
    pub action_taken: ScalingAction,
    /// Confidence of the prediction.
    pub confidence: f64,
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
    /// Whether execution (or the gated no-op) succeeded.
    pub execution_success: bool,
    /// Whether the external backend performed the action.
    pub used_external_backend: bool,
}

impl AutoScalingDecision {
    /// Build an unsaved decision from a cycle's inputs and outcome.
    #[must_use]
    pub fn new(
        snapshot: MetricSnapshot,
        prediction: ScalingPrediction,
        timestamp: DateTime<Utc>,
        execution_success: bool,
        used_external_backend: bool,
    ) -> Self {
        Self {
            id: None,
            action_taken: prediction.action,
            confidence: prediction.confidence,
            snapshot,
            prediction,
            timestamp,
            execution_success,
            used_external_backend,
        }
    }

    /// Whether the decision came from the fallback rule table.
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.prediction.is_fallback()
    }
}

/// Append-only log of decisions.
#[derive(Clone)]
pub struct DecisionLog {
    store: Arc<dyn DecisionStore>,
    clock: Arc<dyn TimeProvider>,
}

impl std::fmt::Debug for DecisionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionLog").finish_non_exhaustive()
    }
}

impl DecisionLog {
    /// Create a log over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DecisionStore>, clock: Arc<dyn TimeProvider>) -> Self {
        Self { store, clock }
    }

    /// Append a decision, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the row cannot be written.
    pub async fn record(&self, decision: &AutoScalingDecision) -> Result<i64, StorageError> {
        let id = self.store.insert_decision(decision).await?;
        tracing::debug!(
            id,
            action = %decision.action_taken,
            confidence = decision.confidence,
            execution_success = decision.execution_success,
            "Decision recorded"
        );
        Ok(id)
    }

    /// Decisions from the last `window`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the log cannot be read.
    pub async fn recent(&self, window: Duration) -> Result<Vec<AutoScalingDecision>, StorageError> {
        self.store.decisions_since(self.clock.now() - window).await
    }

    /// The `limit` newest decisions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the log cannot be read.
    pub async fn latest(&self, limit: u32) -> Result<Vec<AutoScalingDecision>, StorageError> {
        self.store.latest_decisions(limit).await
    }

    /// Decisions for `action` from the last `window`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the log cannot be read.
    pub async fn by_action(
        &self,
        action: ScalingAction,
        window: Duration,
    ) -> Result<Vec<AutoScalingDecision>, StorageError> {
        self.store
            .decisions_by_action(action, self.clock.now() - window)
            .await
    }

    /// Aggregate the last `window` of decisions.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the log cannot be read.
    pub async fn summary(
        &self,
        window: Duration,
        confidence_threshold: f64,
    ) -> Result<DecisionSummary, StorageError> {
        let decisions = self.recent(window).await?;
        Ok(DecisionSummary::from_decisions(
            &decisions,
            confidence_threshold,
        ))
    }
}
