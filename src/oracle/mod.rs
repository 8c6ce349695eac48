//! Prediction oracle.
//!
//! [`PredictionOracle`] asks the remote prediction service for a scaling
//! action and degrades to the deterministic rule table in [`fallback`] on
//! any failure. A [`CircuitBreaker`] stops calling a service that keeps
//! failing. `predict` itself never fails.

mod circuit_breaker;
mod client;
pub mod fallback;
mod types;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use client::{HttpPredictionClient, PREDICT_PATH};
pub use fallback::{fallback_prediction, FALLBACK_CONFIDENCE};
pub use types::{PredictionResponse, PredictionSource, ScalingAction, ScalingPrediction};

use std::sync::{Arc, Mutex};

use crate::collector::MetricSnapshot;
use crate::error::OracleError;
use crate::traits::{PredictionService, TimeProvider};

/// Oracle with fallback.
pub struct PredictionOracle {
    service: Arc<dyn PredictionService>,
    breaker: Mutex<CircuitBreaker>,
    clock: Arc<dyn TimeProvider>,
}

impl std::fmt::Debug for PredictionOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionOracle")
            .field("circuit", &self.circuit_state())
            .finish_non_exhaustive()
    }
}

impl PredictionOracle {
    /// Create an oracle with the default breaker thresholds.
    #[must_use]
    pub fn new(service: Arc<dyn PredictionService>, clock: Arc<dyn TimeProvider>) -> Self {
        Self::with_breaker(service, clock, CircuitBreakerConfig::default())
    }

    /// Create an oracle with custom breaker thresholds.
    #[must_use]
    pub fn with_breaker(
        service: Arc<dyn PredictionService>,
        clock: Arc<dyn TimeProvider>,
        config: CircuitBreakerConfig,
    ) -> Self {
        Self {
            service,
            breaker: Mutex::new(CircuitBreaker::new(config)),
            clock,
        }
    }

    /// Current breaker state. A poisoned lock reads as closed.
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker
            .lock()
            .map_or(CircuitState::Closed, |breaker| breaker.state())
    }

    /// Time until an open circuit half-opens. `None` unless open.
    #[must_use]
    pub fn retry_in(&self) -> Option<chrono::Duration> {
        self.breaker
            .lock()
            .ok()
            .and_then(|breaker| breaker.remaining_cooldown(self.clock.now()))
    }

    /// Predict a scaling action for `snapshot`.
    ///
    /// Returns the service's answer when it is reachable and well-formed,
    /// otherwise the rule-table prediction.
    pub async fn predict(&self, snapshot: &MetricSnapshot) -> ScalingPrediction {
        match self.try_remote(snapshot).await {
            Ok(prediction) => prediction,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    cpu_usage = snapshot.cpu_usage,
                    memory_usage = snapshot.memory_usage,
                    response_time_ms = snapshot.response_time_ms,
                    "Prediction service unavailable, using fallback rules"
                );
                fallback_prediction(snapshot, self.clock.now())
            }
        }
    }

    async fn try_remote(&self, snapshot: &MetricSnapshot) -> Result<ScalingPrediction, OracleError> {
        if !self.allow_call() {
            tracing::debug!(
                retry_in_secs = self.retry_in().map(|d| d.num_seconds()),
                "Prediction circuit open, skipping remote call"
            );
            return Err(OracleError::CircuitOpen);
        }

        let result = self.service.predict(snapshot).await;

        if let Ok(mut breaker) = self.breaker.lock() {
            match &result {
                Ok(_) => breaker.record_success(),
                Err(_) => {
                    let before = breaker.state();
                    breaker.record_failure(self.clock.now());
                    if before != CircuitState::Open && breaker.state() == CircuitState::Open {
                        tracing::warn!(trips = breaker.trips(), "Prediction circuit opened");
                    }
                }
            }
        }

        result
    }

    fn allow_call(&self) -> bool {
        self.breaker
            .lock()
            .map_or(true, |mut breaker| breaker.is_allowed(self.clock.now()))
    }
}
