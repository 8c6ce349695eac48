//! Trait implementations for `SqliteStorage`.

#![allow(clippy::missing_errors_doc)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::core::SqliteStorage;
use crate::collector::{HistoryField, MetricSample};
use crate::decision::AutoScalingDecision;
use crate::error::StorageError;
use crate::oracle::ScalingAction;
use crate::traits::{CountRegister, DecisionStore, HistoryStore};

#[async_trait]
impl DecisionStore for SqliteStorage {
    async fn insert_decision(&self, decision: &AutoScalingDecision) -> Result<i64, StorageError> {
        self.save_decision(decision).await
    }

    async fn decisions_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AutoScalingDecision>, StorageError> {
        self.get_decisions_since(since).await
    }

    async fn latest_decisions(&self, limit: u32) -> Result<Vec<AutoScalingDecision>, StorageError> {
        self.get_latest_decisions(limit).await
    }

    async fn decisions_by_action(
        &self,
        action: ScalingAction,
        since: DateTime<Utc>,
    ) -> Result<Vec<AutoScalingDecision>, StorageError> {
        self.get_decisions_by_action(action, since).await
    }
}

#[async_trait]
impl CountRegister for SqliteStorage {
    async fn load_count(&self) -> Result<Option<u32>, StorageError> {
        self.get_instance_count().await
    }

    async fn store_count(&self, count: u32) -> Result<(), StorageError> {
        self.set_instance_count(count).await
    }
}

#[async_trait]
impl HistoryStore for SqliteStorage {
    async fn record_sample(&self, sample: &MetricSample) -> Result<(), StorageError> {
        self.save_sample(sample).await
    }

    async fn average_between(
        &self,
        field: HistoryField,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Option<f64>, StorageError> {
        self.get_sample_average(field, since, until).await
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        self.delete_samples_before(cutoff).await
    }
}
