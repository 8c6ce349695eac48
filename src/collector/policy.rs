//! Metric query and default policy.
//!
//! One table maps every monitored field to its PromQL template and the
//! value used when the query fails.

use crate::error::CollectionError;

/// Fields read from the monitoring backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    /// Average CPU utilisation, percent.
    CpuUsage,
    /// Average memory utilisation, percent of limit.
    MemoryUsage,
    /// Aggregate request rate.
    RequestsPerSecond,
    /// Mean response time, milliseconds.
    ResponseTimeMs,
    /// Inbound network throughput, MB/s.
    NetworkInMbps,
    /// Outbound network throughput, MB/s.
    NetworkOutMbps,
    /// Pending background jobs.
    QueueLength,
    /// Open client connections.
    ActiveConnections,
}

/// Placeholder substituted with the configured range window.
const WINDOW: &str = "{window}";

/// Query template and fallback for one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldPolicy {
    /// Field this entry describes.
    pub field: MetricField,
    /// PromQL template; `{window}` is replaced by the metrics window.
    pub template: &'static str,
    /// Value used when the query fails or returns nothing.
    pub default: f64,
}

/// The policy table.
pub const POLICY: [FieldPolicy; 8] = [
    FieldPolicy {
        field: MetricField::CpuUsage,
        template: "avg(rate(container_cpu_usage_seconds_total[{window}])) * 100",
        default: 0.3,
    },
    FieldPolicy {
        field: MetricField::MemoryUsage,
        template: "avg(container_memory_usage_bytes / container_spec_memory_limit_bytes) * 100",
        default: 0.3,
    },
    FieldPolicy {
        field: MetricField::RequestsPerSecond,
        template: "sum(rate(http_requests_total[{window}]))",
        default: 10.0,
    },
    FieldPolicy {
        field: MetricField::ResponseTimeMs,
        template:
            "avg(http_request_duration_seconds_sum / http_request_duration_seconds_count) * 1000",
        default: 100.0,
    },
    FieldPolicy {
        field: MetricField::NetworkInMbps,
        template: "sum(rate(container_network_receive_bytes_total[{window}])) / 1024 / 1024",
        default: 1.0,
    },
    FieldPolicy {
        field: MetricField::NetworkOutMbps,
        template: "sum(rate(container_network_transmit_bytes_total[{window}])) / 1024 / 1024",
        default: 1.0,
    },
    FieldPolicy {
        field: MetricField::QueueLength,
        template: "sum(job_queue_length)",
        default: 0.0,
    },
    FieldPolicy {
        field: MetricField::ActiveConnections,
        template: "sum(active_connections)",
        default: 10.0,
    },
];

impl MetricField {
    /// Snapshot key for this field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CpuUsage => "cpu_usage",
            Self::MemoryUsage => "memory_usage",
            Self::RequestsPerSecond => "requests_per_second",
            Self::ResponseTimeMs => "response_time_ms",
            Self::NetworkInMbps => "network_in_mbps",
            Self::NetworkOutMbps => "network_out_mbps",
            Self::QueueLength => "queue_length",
            Self::ActiveConnections => "active_connections",
        }
    }

    /// Policy entry for this field.
    #[must_use]
    pub fn policy(self) -> &'static FieldPolicy {
        // POLICY lists every variant exactly once, in declaration order.
        &POLICY[self as usize]
    }

    /// Documented default.
    #[must_use]
    pub fn default_value(self) -> f64 {
        self.policy().default
    }

    /// Concrete query for `window` (e.g. `5m`).
    #[must_use]
    pub fn query(self, window: &str) -> String {
        self.policy().template.replace(WINDOW, window)
    }

    /// Resolve a fetch result, substituting the default on error.
    pub fn resolve(self, result: Result<f64, CollectionError>) -> f64 {
        match result {
            Ok(value) => value,
            Err(error) => {
                let default = self.default_value();
                tracing::warn!(
                    field = self.name(),
                    error = %error,
                    default,
                    "Metric unavailable, using default"
                );
                default
            }
        }
    }
}

/// Default 1h/4h/24h CPU average.
pub const DEFAULT_CPU_AVG: f64 = 0.3;
/// Default 1h memory average.
pub const DEFAULT_MEMORY_AVG: f64 = 0.3;
/// Default 1h request-rate average.
pub const DEFAULT_REQUESTS_AVG: f64 = 10.0;

/// Instance count assumed when none is known.
pub const DEFAULT_INSTANCE_COUNT: u32 = 1;
