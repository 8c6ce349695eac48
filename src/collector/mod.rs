//! Metric collection.
//!
//! [`MetricCollector`] assembles a complete [`MetricSnapshot`] every cycle:
//! - live telemetry from the monitoring backend, one concurrent query per
//!   field in the [`policy`] table
//! - 1h/4h/24h averages from the [`HistoryStore`]
//! - calendar features from the injected clock
//! - static workload fields from configuration
//! - the current instance count from the [`InstanceCountStore`]
//!
//! Collection never fails. Anything that cannot be fetched is replaced by
//! its documented default and logged.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

pub mod history;
pub mod policy;
mod snapshot;

pub use history::{HistoryField, MetricSample, RingBufferHistory};
pub use policy::{
    FieldPolicy, MetricField, DEFAULT_CPU_AVG, DEFAULT_INSTANCE_COUNT, DEFAULT_MEMORY_AVG,
    DEFAULT_REQUESTS_AVG, POLICY,
};
pub use snapshot::{estimate_disk_iops, MetricSnapshot, SNAPSHOT_FIELDS};

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use futures_util::future::join_all;

use crate::config::WorkloadProfile;
use crate::instance::InstanceCountStore;
use crate::traits::{HistoryStore, MonitoringSource, TimeProvider};

/// How long samples are retained for averaging.
pub const HISTORY_RETENTION_HOURS: i64 = 25;

/// Assembles snapshots.
pub struct MetricCollector {
    source: Arc<dyn MonitoringSource>,
    instances: InstanceCountStore,
    history: Arc<dyn HistoryStore>,
    clock: Arc<dyn TimeProvider>,
    workload: WorkloadProfile,
    window: String,
}

impl std::fmt::Debug for MetricCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricCollector")
            .field("instances", &self.instances)
            .field("workload", &self.workload)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

struct Averages {
    cpu_1h: f64,
    cpu_4h: f64,
    cpu_24h: f64,
    memory_1h: f64,
    requests_1h: f64,
}

impl MetricCollector {
    /// Create a collector.
    #[must_use]
    pub fn new(
        source: Arc<dyn MonitoringSource>,
        instances: InstanceCountStore,
        history: Arc<dyn HistoryStore>,
        clock: Arc<dyn TimeProvider>,
        workload: WorkloadProfile,
        window: impl Into<String>,
    ) -> Self {
        Self {
            source,
            instances,
            history,
            clock,
            workload,
            window: window.into(),
        }
    }

    /// Collect a snapshot and append the observed values to the history.
    pub async fn collect(&self) -> MetricSnapshot {
        let now = self.clock.now();
        let (snapshot, observed) = self.assemble(now).await;
        self.remember(&observed).await;
        snapshot
    }

    /// Collect a snapshot without touching the history.
    pub async fn peek(&self) -> MetricSnapshot {
        self.assemble(self.clock.now()).await.0
    }

    /// Build the snapshot plus a sample holding only the fields the
    /// monitoring backend actually answered.
    async fn assemble(&self, now: DateTime<Utc>) -> (MetricSnapshot, MetricSample) {
        let live = join_all(POLICY.iter().map(|entry| async move {
            let query = entry.field.query(&self.window);
            self.source.query(&query).await
        }));

        let (live, current_instances, averages) =
            tokio::join!(live, self.instances.read(), self.averages(now));
        let observed = |field: MetricField| live[field as usize].as_ref().ok().copied();
        let sample = MetricSample {
            recorded_at: now,
            cpu_usage: observed(MetricField::CpuUsage),
            memory_usage: observed(MetricField::MemoryUsage),
            requests_per_second: observed(MetricField::RequestsPerSecond),
        };
        let resolved: Vec<f64> = POLICY
            .iter()
            .zip(live)
            .map(|(entry, result)| entry.field.resolve(result))
            .collect();
        let value = |field: MetricField| resolved[field as usize];

        let requests_per_second = value(MetricField::RequestsPerSecond);
        let hour = now.hour();
        let day_of_week = now.weekday().num_days_from_sunday();

        let snapshot = MetricSnapshot {
            cpu_usage: value(MetricField::CpuUsage),
            memory_usage: value(MetricField::MemoryUsage),
            requests_per_second,
            response_time_ms: value(MetricField::ResponseTimeMs),
            network_in_mbps: value(MetricField::NetworkInMbps),
            network_out_mbps: value(MetricField::NetworkOutMbps),
            hour,
            day_of_week,
            is_weekend: day_of_week == 0 || day_of_week == 6,
            is_business_hours: (9..=17).contains(&hour),
            app_id: self.workload.app_id,
            app_type: self.workload.app_type.clone(),
            queue_length: value(MetricField::QueueLength).max(0.0).round() as u64,
            active_connections: value(MetricField::ActiveConnections).max(0.0).round() as u64,
            allocated_cpu_cores: self.workload.allocated_cpu_cores,
            allocated_memory_gb: self.workload.allocated_memory_gb,
            current_instances,
            cpu_usage_1h_avg: averages.cpu_1h,
            cpu_usage_4h_avg: averages.cpu_4h,
            cpu_usage_24h_avg: averages.cpu_24h,
            memory_usage_1h_avg: averages.memory_1h,
            requests_1h_avg: averages.requests_1h,
            disk_io_iops: estimate_disk_iops(requests_per_second),
        };

        tracing::info!(
            cpu_usage = snapshot.cpu_usage,
            memory_usage = snapshot.memory_usage,
            requests_per_second = snapshot.requests_per_second,
            response_time_ms = snapshot.response_time_ms,
            queue_length = snapshot.queue_length,
            current_instances = snapshot.current_instances,
            "Collected metrics"
        );

        (snapshot, sample)
    }

    async fn averages(&self, now: DateTime<Utc>) -> Averages {
        let (cpu_1h, cpu_4h, cpu_24h, memory_1h, requests_1h) = tokio::join!(
            self.average(HistoryField::CpuUsage, 1, DEFAULT_CPU_AVG, now),
            self.average(HistoryField::CpuUsage, 4, DEFAULT_CPU_AVG, now),
            self.average(HistoryField::CpuUsage, 24, DEFAULT_CPU_AVG, now),
            self.average(HistoryField::MemoryUsage, 1, DEFAULT_MEMORY_AVG, now),
            self.average(HistoryField::RequestsPerSecond, 1, DEFAULT_REQUESTS_AVG, now),
        );
        Averages {
            cpu_1h,
            cpu_4h,
            cpu_24h,
            memory_1h,
            requests_1h,
        }
    }

    async fn average(
        &self,
        field: HistoryField,
        hours: i64,
        default: f64,
        now: DateTime<Utc>,
    ) -> f64 {
        match self
            .history
            .average_between(field, now - Duration::hours(hours), now)
            .await
        {
            Ok(Some(avg)) => avg,
            Ok(None) => default,
            Err(error) => {
                tracing::warn!(
                    field = field.column(),
                    hours,
                    error = %error,
                    "History unavailable, using default average"
                );
                default
            }
        }
    }

    async fn remember(&self, sample: &MetricSample) {
        if sample.is_empty() {
            tracing::debug!("No live metrics observed, skipping history sample");
        } else if let Err(error) = self.history.record_sample(sample).await {
            tracing::warn!(error = %error, "Failed to record metric sample");
        }

        match self
            .history
            .prune_before(sample.recorded_at - Duration::hours(HISTORY_RETENTION_HOURS))
            .await
        {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "Pruned old metric samples"),
            Err(error) => tracing::warn!(error = %error, "Failed to prune metric samples"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::error::{CollectionError, StorageError};
    use crate::traits::{
        FixedTimeProvider, MockCountRegister, MockHistoryStore, MockMonitoringSource,
    };
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn register(count: Option<u32>) -> InstanceCountStore {
        let mut register = MockCountRegister::new();
        register.expect_load_count().returning(move || Ok(count));
        InstanceCountStore::Local(Arc::new(register))
    }

    fn collector_at(
        source: MockMonitoringSource,
        history: Arc<dyn HistoryStore>,
        now: DateTime<Utc>,
        count: Option<u32>,
    ) -> MetricCollector {
        MetricCollector::new(
            Arc::new(source),
            register(count),
            history,
            Arc::new(FixedTimeProvider(now)),
            WorkloadProfile::default(),
            "5m",
        )
    }

    fn monday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap()
    }

    fn offline_source() -> MockMonitoringSource {
        let mut source = MockMonitoringSource::new();
        source.expect_query().returning(|_| {
            Err(CollectionError::Transport {
                message: "connection refused".into(),
            })
        });
        source
    }

    fn live_source(value: f64) -> MockMonitoringSource {
        let mut source = MockMonitoringSource::new();
        source.expect_query().returning(move |_| Ok(value));
        source
    }

    #[tokio::test]
    async fn test_all_defaults_when_everything_is_down() {
        let collector = collector_at(
            offline_source(),
            Arc::new(RingBufferHistory::default()),
            monday_noon(),
            None,
        );

        let s = collector.collect().await;
        assert_eq!(s.cpu_usage, 0.3);
        assert_eq!(s.memory_usage, 0.3);
        assert_eq!(s.requests_per_second, 10.0);
        assert_eq!(s.response_time_ms, 100.0);
        assert_eq!(s.network_in_mbps, 1.0);
        assert_eq!(s.network_out_mbps, 1.0);
        assert_eq!(s.queue_length, 0);
        assert_eq!(s.active_connections, 10);
        assert_eq!(s.current_instances, 1);
        assert_eq!(s.cpu_usage_1h_avg, 0.3);
        assert_eq!(s.cpu_usage_4h_avg, 0.3);
        assert_eq!(s.cpu_usage_24h_avg, 0.3);
        assert_eq!(s.memory_usage_1h_avg, 0.3);
        assert_eq!(s.requests_1h_avg, 10.0);
        assert_eq!(s.disk_io_iops, 1.0);
        assert_eq!(s.allocated_cpu_cores, 2);
        assert_eq!(s.allocated_memory_gb, 4);
        assert_eq!(s.app_id, 1);
        assert_eq!(s.app_type, "web");
    }

    #[tokio::test]
    async fn test_partial_outage_keeps_live_fields() {
        let mut source = MockMonitoringSource::new();
        source.expect_query().returning(|expr| {
            if expr.contains("container_cpu_usage_seconds_total") {
                Ok(91.5)
            } else if expr == "sum(job_queue_length)" {
                Ok(12.4)
            } else {
                Err(CollectionError::NoData { query: expr.into() })
            }
        });

        let collector = collector_at(
            source,
            Arc::new(RingBufferHistory::default()),
            monday_noon(),
            Some(3),
        );
        let s = collector.collect().await;
        assert_eq!(s.cpu_usage, 91.5);
        assert_eq!(s.queue_length, 12);
        assert_eq!(s.memory_usage, 0.3);
        assert_eq!(s.current_instances, 3);
    }

    #[tokio::test]
    async fn test_queries_use_metrics_window() {
        let mut source = MockMonitoringSource::new();
        source
            .expect_query()
            .withf(|expr| expr.contains("[5m]") || !expr.contains('['))
            .times(POLICY.len())
            .returning(|_| Ok(1.0));

        let collector = collector_at(
            source,
            Arc::new(RingBufferHistory::default()),
            monday_noon(),
            None,
        );
        collector.peek().await;
    }

    #[test_case::test_case(2025, 1, 6, 12, 1, false, true ; "monday noon")]
    #[test_case::test_case(2025, 1, 5, 9, 0, true, true ; "sunday nine")]
    #[test_case::test_case(2025, 1, 11, 17, 6, true, true ; "saturday five pm")]
    #[test_case::test_case(2025, 1, 7, 18, 2, false, false ; "tuesday evening")]
    #[test_case::test_case(2025, 1, 8, 8, 3, false, false ; "wednesday early")]
    fn test_calendar_features(
        y: i32,
        m: u32,
        d: u32,
        h: u32,
        dow: u32,
        weekend: bool,
        business: bool,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let now = Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap();
        let collector = collector_at(
            offline_source(),
            Arc::new(RingBufferHistory::default()),
            now,
            None,
        );

        let s = runtime.block_on(collector.peek());
        assert_eq!(s.hour, h);
        assert_eq!(s.day_of_week, dow);
        assert_eq!(s.is_weekend, weekend);
        assert_eq!(s.is_business_hours, business);
    }

    #[tokio::test]
    async fn test_averages_come_from_prior_samples_only() {
        let history = Arc::new(RingBufferHistory::default());
        let now = monday_noon();
        for (minutes_ago, cpu) in [(30, 40.0), (150, 20.0), (600, 80.0)] {
            history
                .record_sample(&MetricSample {
                    recorded_at: now - Duration::minutes(minutes_ago),
                    cpu_usage: Some(cpu),
                    memory_usage: Some(50.0),
                    requests_per_second: Some(200.0),
                })
                .await
                .unwrap();
        }

        let mut source = MockMonitoringSource::new();
        source.expect_query().returning(|_| Ok(99.0));
        let collector = collector_at(source, history.clone(), now, Some(2));

        let s = collector.collect().await;
        assert_eq!(s.cpu_usage_1h_avg, 40.0);
        assert_eq!(s.cpu_usage_4h_avg, 30.0);
        assert_eq!(s.cpu_usage_24h_avg, 140.0 / 3.0);
        assert_eq!(s.memory_usage_1h_avg, 50.0);
        assert_eq!(s.requests_1h_avg, 200.0);
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn test_peek_does_not_record() {
        let history = Arc::new(RingBufferHistory::default());
        let collector = collector_at(live_source(50.0), history.clone(), monday_noon(), None);
        collector.peek().await;
        assert!(history.is_empty());
        collector.collect().await;
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_outage_cycle_does_not_skew_averages() {
        let history: Arc<RingBufferHistory> = Arc::new(RingBufferHistory::default());
        let start = monday_noon();

        collector_at(live_source(90.0), history.clone(), start, None)
            .collect()
            .await;
        let during_outage = collector_at(
            offline_source(),
            history.clone(),
            start + Duration::minutes(1),
            None,
        )
        .collect()
        .await;
        assert_eq!(during_outage.cpu_usage, 0.3);
        assert_eq!(during_outage.cpu_usage_1h_avg, 90.0);
        assert_eq!(history.len(), 1);

        let after = collector_at(
            live_source(90.0),
            history.clone(),
            start + Duration::minutes(2),
            None,
        )
        .collect()
        .await;
        assert_eq!(after.cpu_usage_1h_avg, 90.0);
        assert_eq!(after.memory_usage_1h_avg, 90.0);
        assert_eq!(after.requests_1h_avg, 90.0);
    }

    #[tokio::test]
    async fn test_partial_outage_records_only_observed_fields() {
        let mut source = MockMonitoringSource::new();
        source.expect_query().returning(|expr| {
            if expr.contains("container_cpu_usage_seconds_total") {
                Ok(70.0)
            } else {
                Err(CollectionError::NoData { query: expr.into() })
            }
        });
        let history = Arc::new(RingBufferHistory::default());
        let start = monday_noon();
        collector_at(source, history.clone(), start, None)
            .collect()
            .await;

        let now = start + Duration::minutes(1);
        let cpu = history
            .average_between(HistoryField::CpuUsage, now - Duration::hours(1), now)
            .await
            .unwrap();
        let memory = history
            .average_between(HistoryField::MemoryUsage, now - Duration::hours(1), now)
            .await
            .unwrap();
        assert_eq!(cpu, Some(70.0));
        assert_eq!(memory, None);
    }

    #[tokio::test]
    async fn test_full_outage_records_nothing() {
        let mut history = MockHistoryStore::new();
        history
            .expect_average_between()
            .returning(|_, _, _| Ok(None));
        history.expect_record_sample().never();
        history.expect_prune_before().times(1).returning(|_| Ok(0));

        let collector = collector_at(offline_source(), Arc::new(history), monday_noon(), None);
        let s = collector.collect().await;
        assert_eq!(s.cpu_usage, 0.3);
    }

    #[tokio::test]
    async fn test_history_errors_use_defaults() {
        let mut history = MockHistoryStore::new();
        history.expect_average_between().returning(|_, _, _| {
            Err(StorageError::ConnectionFailed {
                message: "locked".into(),
            })
        });
        history.expect_record_sample().times(1).returning(|_| {
            Err(StorageError::ConnectionFailed {
                message: "locked".into(),
            })
        });
        history.expect_prune_before().times(1).returning(|_| Ok(0));

        let collector = collector_at(live_source(40.0), Arc::new(history), monday_noon(), None);
        let s = collector.collect().await;
        assert_eq!(s.cpu_usage_24h_avg, 0.3);
        assert_eq!(s.requests_1h_avg, 10.0);
    }
}
