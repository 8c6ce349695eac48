//! Trait definitions for injectable dependencies.
//!
//! This module defines traits for:
//! - [`MonitoringSource`]: Time-series query backend
//! - [`PredictionService`]: Remote scaling oracle
//! - [`ScalingBackend`]: Infrastructure control plane (real or simulated)
//! - [`CountRegister`]: Local instance-count register
//! - [`DecisionStore`]: Append-only decision persistence
//! - [`HistoryStore`]: Prior metric samples for historical averages
//! - [`TimeProvider`]: Time abstraction for testing
//!
//! # Mocking
//!
//! All traits are annotated with `#[cfg_attr(test, mockall::automock)]`
//! which generates mock implementations automatically for testing.
//!
//! # Example
//!
//! ```
//! use ml_autoscaler::traits::{TimeProvider, RealTimeProvider};
//!
//! let time_provider = RealTimeProvider;
//! let now = time_provider.now();
//! println!("Current time: {now}");
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::collector::{HistoryField, MetricSample, MetricSnapshot};
use crate::decision::AutoScalingDecision;
use crate::error::{BackendError, CollectionError, OracleError, StorageError};
use crate::oracle::{ScalingAction, ScalingPrediction};

/// Scalar query interface against a time-series backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MonitoringSource: Send + Sync {
    /// Evaluate `expr` and return a single scalar.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError`] when the backend has no data, times out,
    /// or answers with something other than a scalar.
    async fn query(&self, expr: &str) -> Result<f64, CollectionError>;
}

/// Remote prediction service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Score a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] on timeout, transport failure, non-2xx status
    /// or a response that does not describe a valid prediction.
    async fn predict(&self, snapshot: &MetricSnapshot) -> Result<ScalingPrediction, OracleError>;
}

/// Infrastructure control plane that can change the instance count.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScalingBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Number of instances currently running.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the control plane cannot be queried.
    async fn current_count(&self) -> Result<u32, BackendError>;

    /// Converge on `target` instances. `Ok(false)` means the control plane
    /// refused the change.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request itself failed.
    async fn scale_to(&self, target: u32) -> Result<bool, BackendError>;
}

/// Persistent single-value register for the simulated instance count.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountRegister: Send + Sync {
    /// Load the stored count, `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the register is unreachable.
    async fn load_count(&self) -> Result<Option<u32>, StorageError>;

    /// Overwrite the stored count.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the register is unreachable.
    async fn store_count(&self, count: u32) -> Result<(), StorageError>;
}

/// Append-only persistence for evaluation decisions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Append a decision, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database operation fails.
    async fn insert_decision(&self, decision: &AutoScalingDecision) -> Result<i64, StorageError>;

    /// Decisions with `timestamp >= since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database operation fails.
    async fn decisions_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AutoScalingDecision>, StorageError>;

    /// The `limit` most recent decisions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database operation fails.
    async fn latest_decisions(&self, limit: u32) -> Result<Vec<AutoScalingDecision>, StorageError>;

    /// Decisions for one action with `timestamp >= since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database operation fails.
    async fn decisions_by_action(
        &self,
        action: ScalingAction,
        since: DateTime<Utc>,
    ) -> Result<Vec<AutoScalingDecision>, StorageError>;
}

/// Store of prior metric samples.
///
/// Historical averages are always computed from here, never by re-running
/// the live collector.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a sample.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the sample cannot be stored.
    async fn record_sample(&self, sample: &MetricSample) -> Result<(), StorageError>;

    /// Mean of `field` over samples recorded in `[since, until)`, `None`
    /// when the window is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store cannot be read.
    async fn average_between(
        &self,
        field: HistoryField,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Option<f64>, StorageError>;

    /// Drop samples recorded before `cutoff`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store cannot be written.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError>;
}

/// Time provider trait for deterministic testing.
///
/// This trait abstracts time operations to allow for
/// deterministic testing by providing fixed timestamps.
#[cfg_attr(test, mockall::automock)]
pub trait TimeProvider: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Real time provider using system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time provider frozen at a fixed instant.
///
/// Used by tests and by callers that replay historical snapshots.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeProvider(pub DateTime<Utc>);

impl TimeProvider for FixedTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
