//! Metric sample history.

#![allow(clippy::missing_errors_doc)]

use chrono::{DateTime, Utc};
use sqlx::Row;

use super::core::SqliteStorage;
use crate::collector::{HistoryField, MetricSample};
use crate::error::StorageError;

impl SqliteStorage {
    /// Append a metric sample.
    pub async fn save_sample(&self, sample: &MetricSample) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO metric_samples (recorded_at, cpu_usage, memory_usage, requests_per_second)
             VALUES (?, ?, ?, ?)",
        )
        .bind(Self::format_datetime(sample.recorded_at))
        .bind(sample.cpu_usage)
        .bind(sample.memory_usage)
        .bind(sample.requests_per_second)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::query_error("INSERT metric_samples", format!("{e}")))?;

        Ok(())
    }

    /// Mean of `field` over samples in `[since, until)`.
    pub async fn get_sample_average(
        &self,
        field: HistoryField,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Option<f64>, StorageError> {
        // Column names come from a closed enum, never from input.
        let row = sqlx::query(&format!(
            "SELECT AVG({}) AS average FROM metric_samples
             WHERE recorded_at >= ? AND recorded_at < ?",
            field.column()
        ))
        .bind(Self::format_datetime(since))
        .bind(Self::format_datetime(until))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::query_error("SELECT AVG metric_samples", format!("{e}")))?;

        Ok(row.get::<Option<f64>, _>("average"))
    }

    /// Delete samples recorded before `cutoff`.
    pub async fn delete_samples_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM metric_samples WHERE recorded_at < ?")
            .bind(Self::format_datetime(cutoff))
            .execute(&self.pool)
            .await
            .map_err(|e| Self::query_error("DELETE metric_samples", format!("{e}")))?;

        Ok(result.rows_affected())
    }
}
