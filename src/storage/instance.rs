//! Instance count register.

#![allow(clippy::missing_errors_doc)]

use sqlx::Row;

use super::core::SqliteStorage;
use crate::error::StorageError;

impl SqliteStorage {
    /// Read the stored instance count, `None` if never written.
    pub async fn get_instance_count(&self) -> Result<Option<u32>, StorageError> {
        let row = sqlx::query("SELECT count FROM instance_counts WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::query_error("SELECT instance_counts", format!("{e}")))?;

        row.map(|row| {
            let count: i64 = row.get("count");
            u32::try_from(count).map_err(|_| StorageError::Internal {
                message: format!("stored instance count {count} out of range"),
            })
        })
        .transpose()
    }

    /// Overwrite the stored instance count.
    pub async fn set_instance_count(&self, count: u32) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO instance_counts (id, count, updated_at) VALUES (1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET count = excluded.count, updated_at = excluded.updated_at",
        )
        .bind(i64::from(count))
        .bind(Self::format_datetime(self.clock.now()))
        .execute(&self.pool)
        .await
        .map_err(|e| Self::query_error("UPSERT instance_counts", format!("{e}")))?;

        Ok(())
    }
}
