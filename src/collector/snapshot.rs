//! The telemetry snapshot handed to the oracle.

use serde::{Deserialize, Serialize};

/// Flat snapshot of workload and infrastructure telemetry.
///
/// Every field is mandatory; the collector substitutes documented defaults
/// for anything it could not fetch, so the serialized object always carries
/// the full key set the prediction service expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Average CPU utilisation, percent.
    pub cpu_usage: f64,
    /// Average memory utilisation, percent of limit.
    pub memory_usage: f64,
    /// Aggregate request rate.
    pub requests_per_second: f64,
    /// Mean response time in milliseconds.
    pub response_time_ms: f64,
    /// Inbound network throughput, MB/s.
    pub network_in_mbps: f64,
    /// Outbound network throughput, MB/s.
    pub network_out_mbps: f64,
    /// Hour of day (UTC), 0–23.
    pub hour: u32,
    /// Day of week, 0 = Sunday.
    pub day_of_week: u32,
    /// Saturday or Sunday.
    pub is_weekend: bool,
    /// Hour within 09–17.
    pub is_business_hours: bool,
    /// Application identifier.
    pub app_id: u32,
    /// Application category.
    pub app_type: String,
    /// Pending background jobs.
    pub queue_length: u64,
    /// Open client connections.
    pub active_connections: u64,
    /// CPU cores per instance.
    pub allocated_cpu_cores: u32,
    /// Memory per instance, GB.
    pub allocated_memory_gb: u32,
    /// Instance count at collection time.
    pub current_instances: u32,
    /// Mean CPU over the last hour.
    pub cpu_usage_1h_avg: f64,
    /// Mean CPU over the last four hours.
    pub cpu_usage_4h_avg: f64,
    /// Mean CPU over the last day.
    pub cpu_usage_24h_avg: f64,
    /// Mean memory over the last hour.
    pub memory_usage_1h_avg: f64,
    /// Mean request rate over the last hour.
    pub requests_1h_avg: f64,
    /// Disk IOPS estimate derived from the request rate.
    pub disk_io_iops: f64,
}

/// Field names the prediction service requires, in wire order.
pub const SNAPSHOT_FIELDS: [&str; 23] = [
    "cpu_usage",
    "memory_usage",
    "requests_per_second",
    "response_time_ms",
    "network_in_mbps",
    "network_out_mbps",
    "hour",
    "day_of_week",
    "is_weekend",
    "is_business_hours",
    "app_id",
    "app_type",
    "queue_length",
    "active_connections",
    "allocated_cpu_cores",
    "allocated_memory_gb",
    "current_instances",
    "cpu_usage_1h_avg",
    "cpu_usage_4h_avg",
    "cpu_usage_24h_avg",
    "memory_usage_1h_avg",
    "requests_1h_avg",
    "disk_io_iops",
];

/// Disk IOPS estimate: a tenth of the request rate, two decimals.
#[must_use]
pub fn estimate_disk_iops(requests_per_second: f64) -> f64 {
    (requests_per_second * 0.1 * 100.0).round() / 100.0
}
