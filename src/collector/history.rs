//! Prior metric samples.
//!
//! The collector appends one [`MetricSample`] per cycle and computes the
//! 1h/4h/24h averages from earlier samples. [`RingBufferHistory`] is the
//! in-process store; the SQLite store lives in `storage`.

use std::collections::VecDeque;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::traits::HistoryStore;

/// Maximum samples kept in memory (25h at one sample per 15s).
pub const MAX_SAMPLES: usize = 6_000;

/// Fields with historical averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryField {
    /// CPU utilisation.
    CpuUsage,
    /// Memory utilisation.
    MemoryUsage,
    /// Request rate.
    RequestsPerSecond,
}

impl HistoryField {
    /// Column name in the `metric_samples` table.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CpuUsage => "cpu_usage",
            Self::MemoryUsage => "memory_usage",
            Self::RequestsPerSecond => "requests_per_second",
        }
    }
}

/// One recorded sample.
///
/// A field is `None` when the monitoring backend did not answer for it.
/// Averages skip missing fields rather than counting defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// When the sample was collected.
    pub recorded_at: DateTime<Utc>,
    /// CPU utilisation, percent.
    pub cpu_usage: Option<f64>,
    /// Memory utilisation, percent.
    pub memory_usage: Option<f64>,
    /// Request rate.
    pub requests_per_second: Option<f64>,
}

impl MetricSample {
    /// Observed value of `field`, if any.
    #[must_use]
    pub const fn get(&self, field: HistoryField) -> Option<f64> {
        match field {
            HistoryField::CpuUsage => self.cpu_usage,
            HistoryField::MemoryUsage => self.memory_usage,
            HistoryField::RequestsPerSecond => self.requests_per_second,
        }
    }

    /// Whether no field was observed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cpu_usage.is_none()
            && self.memory_usage.is_none()
            && self.requests_per_second.is_none()
    }
}

/// Bounded in-memory history.
#[derive(Debug)]
pub struct RingBufferHistory {
    samples: RwLock<VecDeque<MetricSample>>,
    capacity: usize,
}

impl Default for RingBufferHistory {
    fn default() -> Self {
        Self::with_capacity(MAX_SAMPLES)
    }
}

impl RingBufferHistory {
    /// Create an empty buffer holding at most `capacity` samples.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: RwLock::new(VecDeque::with_capacity(capacity.min(MAX_SAMPLES))),
            capacity: capacity.max(1),
        }
    }

    /// Number of samples held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StorageError {
    StorageError::Internal {
        message: "history buffer lock poisoned".into(),
    }
}

#[async_trait]
impl HistoryStore for RingBufferHistory {
    async fn record_sample(&self, sample: &MetricSample) -> Result<(), StorageError> {
        let mut samples = self.samples.write().map_err(|_| poisoned())?;
        if samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(*sample);
        Ok(())
    }

    async fn average_between(
        &self,
        field: HistoryField,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Option<f64>, StorageError> {
        let samples = self.samples.read().map_err(|_| poisoned())?;
        let (sum, count) = samples
            .iter()
            .filter(|s| s.recorded_at >= since && s.recorded_at < until)
            .filter_map(|s| s.get(field))
            .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));

        Ok((count > 0).then(|| sum / f64::from(count)))
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let mut samples = self.samples.write().map_err(|_| poisoned())?;
        let before = samples.len();
        samples.retain(|s| s.recorded_at >= cutoff);
        Ok((before - samples.len()) as u64)
    }
}
