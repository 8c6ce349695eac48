//! Autoscaling controller.
//!
//! Runs the evaluation cycle:
//! collect → predict → gate → execute → record.
//!
//! At most one cycle runs at a time. A tick that finds a cycle in flight is
//! skipped, not queued. Every completed cycle records exactly one decision.

mod report;

pub use report::{CycleReport, CycleStatus, EvaluationAck, EvaluationPreview};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::Instrument;
use uuid::Uuid;

use crate::collector::MetricCollector;
use crate::config::ScalingConfig;
use crate::decision::{AutoScalingDecision, DecisionLog, DecisionSummary};
use crate::error::{AppError, StorageError};
use crate::executor::{ExecutionOutcome, ScalingExecutor};
use crate::instance::InstanceCountStore;
use crate::oracle::{CircuitState, PredictionOracle, ScalingAction};
use crate::traits::TimeProvider;

/// Owns the evaluation cycle and the enable switch.
pub struct AutoScalingController {
    collector: MetricCollector,
    oracle: PredictionOracle,
    executor: ScalingExecutor,
    log: DecisionLog,
    instances: InstanceCountStore,
    clock: Arc<dyn TimeProvider>,
    policy: ScalingConfig,
    enabled: AtomicBool,
    in_flight: Mutex<()>,
}

impl std::fmt::Debug for AutoScalingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoScalingController")
            .field("enabled", &self.is_enabled())
            .field("policy", &self.policy)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl AutoScalingController {
    /// Wire a controller from its components.
    #[must_use]
    pub fn new(
        collector: MetricCollector,
        oracle: PredictionOracle,
        executor: ScalingExecutor,
        log: DecisionLog,
        instances: InstanceCountStore,
        clock: Arc<dyn TimeProvider>,
        policy: ScalingConfig,
    ) -> Self {
        Self {
            collector,
            oracle,
            executor,
            log,
            instances,
            clock,
            enabled: AtomicBool::new(policy.enabled),
            policy,
            in_flight: Mutex::new(()),
        }
    }

    /// Whether scheduled cycles run.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Switch autoscaling on or off. A running cycle is not interrupted.
    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            tracing::info!(enabled, "Autoscaling {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    /// Flip the switch, returning the new state.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::SeqCst);
        tracing::info!(enabled, "Autoscaling toggled");
        enabled
    }

    /// The scaling policy in force.
    #[must_use]
    pub const fn policy(&self) -> &ScalingConfig {
        &self.policy
    }

    /// Run one evaluation cycle now, unless disabled or already running.
    pub async fn tick(&self) -> CycleStatus {
        if !self.is_enabled() {
            tracing::debug!("Autoscaling disabled, skipping evaluation");
            return CycleStatus::SkippedDisabled;
        }

        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!("Previous evaluation still running, skipping");
            return CycleStatus::SkippedInFlight;
        };

        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("evaluation_cycle", cycle_id = %cycle_id);

        match self.run_cycle(cycle_id).instrument(span.clone()).await {
            Ok(report) => CycleStatus::Completed(report),
            Err(error) => {
                span.in_scope(|| tracing::error!(error = %error, "Evaluation cycle failed"));
                CycleStatus::Failed {
                    cycle_id,
                    message: error.to_string(),
                }
            }
        }
    }

    async fn run_cycle(&self, cycle_id: Uuid) -> Result<CycleReport, AppError> {
        let snapshot = self.collector.collect().await;
        let prediction = self.oracle.predict(&snapshot).await;
        let current = snapshot.current_instances;

        let gated = prediction.confidence < self.policy.confidence_threshold;
        let outcome = if gated {
            tracing::info!(
                action = %prediction.action,
                confidence = prediction.confidence,
                threshold = self.policy.confidence_threshold,
                "Confidence below threshold, not executing"
            );
            ExecutionOutcome::unchanged(current, true)
        } else {
            self.executor.apply(prediction.action, current).await
        };

        let decision = AutoScalingDecision::new(
            snapshot,
            prediction,
            self.clock.now(),
            outcome.success,
            self.instances.is_external(),
        );
        let decision_id = self.log.record(&decision).await?;

        let report = CycleReport {
            cycle_id,
            decision_id,
            action: decision.action_taken,
            confidence: decision.confidence,
            used_fallback: decision.used_fallback(),
            gated,
            outcome,
        };

        tracing::info!(
            decision_id,
            action = %report.action,
            confidence = report.confidence,
            used_fallback = report.used_fallback,
            gated,
            success = outcome.success,
            previous_count = outcome.previous_count,
            new_count = outcome.new_count,
            "Evaluation cycle completed"
        );

        Ok(report)
    }

    /// Run [`tick`](Self::tick) on its own task so a panic stays contained.
    ///
    /// Returns `None` if the cycle panicked or was cancelled.
    pub async fn tick_contained(self: Arc<Self>) -> Option<CycleStatus> {
        match tokio::spawn(async move { self.tick().await }).await {
            Ok(status) => Some(status),
            Err(error) if error.is_panic() => {
                tracing::error!(error = %error, "Evaluation cycle panicked");
                None
            }
            Err(error) => {
                tracing::warn!(error = %error, "Evaluation cycle cancelled");
                None
            }
        }
    }

    /// Schedule one cycle out of band and return immediately.
    ///
    /// Rejected while disabled or while another cycle is running.
    pub fn force_evaluate(self: &Arc<Self>) -> EvaluationAck {
        if !self.is_enabled() {
            return EvaluationAck::rejected("Autoscaling is disabled");
        }
        if self.in_flight.try_lock().is_err() {
            tracing::info!("Manual evaluation skipped, a cycle is already running");
            return EvaluationAck::rejected("Evaluation already in progress");
        }

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.tick_contained().await;
        });
        tracing::info!("Manual evaluation requested");
        EvaluationAck::accepted()
    }

    /// Evaluate on a fixed period until `shutdown` turns true or its
    /// sender is dropped. The first cycle runs immediately.
    pub async fn run(self: Arc<Self>, period: std::time::Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(period_secs = period.as_secs(), "Autoscaling loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    Arc::clone(&self).tick_contained().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Autoscaling loop stopped");
    }

    /// Collect and predict without gating, executing or recording.
    pub async fn preview(&self) -> EvaluationPreview {
        let snapshot = self.collector.peek().await;
        let prediction = self.oracle.predict(&snapshot).await;
        let meets_threshold = prediction.confidence >= self.policy.confidence_threshold;

        EvaluationPreview {
            snapshot,
            prediction,
            meets_threshold,
        }
    }

    /// Current instance count.
    pub async fn current_instance_count(&self) -> u32 {
        self.instances.read().await
    }

    /// State of the prediction circuit breaker.
    #[must_use]
    pub fn oracle_circuit_state(&self) -> CircuitState {
        self.oracle.circuit_state()
    }

    /// Time until an open prediction circuit lets a trial call through.
    #[must_use]
    pub fn oracle_retry_in(&self) -> Option<Duration> {
        self.oracle.retry_in()
    }

    /// Decisions from the last `window`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the decision log cannot be read.
    pub async fn recent_decisions(
        &self,
        window: Duration,
    ) -> Result<Vec<AutoScalingDecision>, StorageError> {
        self.log.recent(window).await
    }

    /// The `limit` newest decisions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the decision log cannot be read.
    pub async fn latest_decisions(
        &self,
        limit: u32,
    ) -> Result<Vec<AutoScalingDecision>, StorageError> {
        self.log.latest(limit).await
    }

    /// Decisions for `action` from the last `window`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the decision log cannot be read.
    pub async fn decisions_by_action(
        &self,
        action: ScalingAction,
        window: Duration,
    ) -> Result<Vec<AutoScalingDecision>, StorageError> {
        self.log.by_action(action, window).await
    }

    /// Counts and rates over the last `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the decision log cannot be read.
    pub async fn decision_summary(&self, window: Duration) -> Result<DecisionSummary, StorageError> {
        self.log
            .summary(window, self.policy.confidence_threshold)
            .await
    }
}
