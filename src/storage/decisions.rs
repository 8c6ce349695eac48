//! Decision log storage operations.

#![allow(clippy::missing_errors_doc)]

use chrono::{DateTime, Utc};
use sqlx::Row;

use super::core::SqliteStorage;
use crate::decision::AutoScalingDecision;
use crate::error::StorageError;
use crate::oracle::ScalingAction;

const SELECT_COLUMNS: &str = "SELECT id, metrics, prediction, action_taken, confidence, timestamp,
        execution_success, used_external_backend
     FROM auto_scaling_decisions";

impl SqliteStorage {
    /// Append a decision row.
    pub async fn save_decision(&self, decision: &AutoScalingDecision) -> Result<i64, StorageError> {
        let metrics = serde_json::to_string(&decision.snapshot).map_err(|e| {
            StorageError::Serialization {
                message: format!("snapshot: {e}"),
            }
        })?;
        let prediction = serde_json::to_string(&decision.prediction).map_err(|e| {
            StorageError::Serialization {
                message: format!("prediction: {e}"),
            }
        })?;

        let result = sqlx::query(
            "INSERT INTO auto_scaling_decisions
                (metrics, prediction, action_taken, confidence, timestamp,
                 execution_success, used_external_backend, used_fallback)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&metrics)
        .bind(&prediction)
        .bind(decision.action_taken.as_str())
        .bind(decision.confidence)
        .bind(Self::format_datetime(decision.timestamp))
        .bind(i32::from(decision.execution_success))
        .bind(i32::from(decision.used_external_backend))
        .bind(i32::from(decision.used_fallback()))
        .execute(&self.pool)
        .await
        .map_err(|e| Self::query_error("INSERT auto_scaling_decisions", format!("{e}")))?;

        Ok(result.last_insert_rowid())
    }

    /// Decisions at or after `since`, oldest first.
    pub async fn get_decisions_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AutoScalingDecision>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE timestamp >= ? ORDER BY timestamp ASC, id ASC"
        ))
        .bind(Self::format_datetime(since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Self::query_error("SELECT auto_scaling_decisions", format!("{e}")))?;

        rows.iter().map(Self::row_to_decision).collect()
    }

    /// The `limit` newest decisions, newest first.
    pub async fn get_latest_decisions(
        &self,
        limit: u32,
    ) -> Result<Vec<AutoScalingDecision>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} ORDER BY timestamp DESC, id DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Self::query_error("SELECT auto_scaling_decisions", format!("{e}")))?;

        rows.iter().map(Self::row_to_decision).collect()
    }

    /// Decisions for `action` at or after `since`, oldest first.
    pub async fn get_decisions_by_action(
        &self,
        action: ScalingAction,
        since: DateTime<Utc>,
    ) -> Result<Vec<AutoScalingDecision>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE action_taken = ? AND timestamp >= ?
             ORDER BY timestamp ASC, id ASC"
        ))
        .bind(action.as_str())
        .bind(Self::format_datetime(since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Self::query_error("SELECT auto_scaling_decisions", format!("{e}")))?;

        rows.iter().map(Self::row_to_decision).collect()
    }

    /// Convert a database row to an [`AutoScalingDecision`].
    fn row_to_decision(row: &sqlx::sqlite::SqliteRow) -> Result<AutoScalingDecision, StorageError> {
        let id: i64 = row.get("id");
        let metrics: String = row.get("metrics");
        let prediction: String = row.get("prediction");
        let action_taken: String = row.get("action_taken");
        let confidence: f64 = row.get("confidence");
        let timestamp: String = row.get("timestamp");
        let execution_success: i32 = row.get("execution_success");
        let used_external_backend: i32 = row.get("used_external_backend");

        let snapshot = serde_json::from_str(&metrics).map_err(|e| StorageError::Serialization {
            message: format!("decision {id} metrics: {e}"),
        })?;
        let prediction =
            serde_json::from_str(&prediction).map_err(|e| StorageError::Serialization {
                message: format!("decision {id} prediction: {e}"),
            })?;
        let action_taken = action_taken
            .parse::<ScalingAction>()
            .map_err(|e| StorageError::Serialization {
                message: format!("decision {id}: {e}"),
            })?;

        Ok(AutoScalingDecision {
            id: Some(id),
            snapshot,
            prediction,
            action_taken,
            confidence,
            timestamp: Self::parse_datetime(&timestamp)?,
            execution_success: execution_success != 0,
            used_external_backend: used_external_backend != 0,
        })
    }
}
