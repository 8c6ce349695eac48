//! Configuration management.
//!
//! This module handles:
//! - Environment variable loading (with `.env` support)
//! - Configuration validation
//! - Default value handling
//!
//! # Example
//!
//! ```
//! use ml_autoscaler::config::{Config, HistoryBackend, ScalingConfig, WorkloadProfile};
//!
//! // Create a config directly (use Config::from_env() in production)
//! let config = Config {
//!     database_path: "./data/autoscaler.db".to_string(),
//!     log_level: "info".to_string(),
//!     prometheus_url: "http://localhost:9090".to_string(),
//!     prediction_service_url: "http://localhost:8000".to_string(),
//!     scaling_backend_url: None,
//!     request_timeout_ms: 10_000,
//!     evaluation_interval_secs: 60,
//!     history_backend: HistoryBackend::Sqlite,
//!     workload: WorkloadProfile::default(),
//!     scaling: ScalingConfig::default(),
//! };
//!
//! assert!(ml_autoscaler::config::validate_config(&config).is_ok());
//! ```

mod scaling;
mod validation;

pub use scaling::{
    ScalingConfig, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_INSTANCES, DEFAULT_METRICS_WINDOW,
    DEFAULT_MIN_INSTANCES,
};
pub use validation::{
    validate_config, MAX_INTERVAL_SECS, MAX_TIMEOUT_MS, MIN_INTERVAL_SECS, MIN_TIMEOUT_MS,
};

use std::str::FromStr;

use crate::error::ConfigError;

/// Default database path.
pub const DEFAULT_DATABASE_PATH: &str = "./data/autoscaler.db";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default Prometheus base URL.
pub const DEFAULT_PROMETHEUS_URL: &str = "http://localhost:9090";

/// Default prediction service base URL.
pub const DEFAULT_PREDICTION_SERVICE_URL: &str = "http://localhost:8000";

/// Default timeout for every outbound call, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default evaluation interval (one cycle per minute).
pub const DEFAULT_EVALUATION_INTERVAL_SECS: u64 = 60;

/// Where prior metric samples are kept for historical averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryBackend {
    /// `metric_samples` table in the SQLite database (survives restarts).
    #[default]
    Sqlite,
    /// Bounded in-process ring buffer.
    Memory,
}

impl FromStr for HistoryBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                var: "HISTORY_BACKEND".into(),
                reason: format!("unknown backend '{other}', expected 'sqlite' or 'memory'"),
            }),
        }
    }
}

/// Static description of the workload being scaled.
///
/// These values are reported to the oracle verbatim on every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadProfile {
    /// Application identifier understood by the prediction service.
    pub app_id: u32,
    /// Application category (e.g. `web`).
    pub app_type: String,
    /// CPU cores allocated per instance.
    pub allocated_cpu_cores: u32,
    /// Memory allocated per instance, in GB.
    pub allocated_memory_gb: u32,
}

impl Default for WorkloadProfile {
    fn default() -> Self {
        Self {
            app_id: 1,
            app_type: "web".to_string(),
            allocated_cpu_cores: 2,
            allocated_memory_gb: 4,
        }
    }
}

/// Application configuration.
///
/// Use [`Config::from_env`] to load configuration from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Database path.
    pub database_path: String,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: String,
    /// Prometheus base URL.
    pub prometheus_url: String,
    /// Prediction service base URL.
    pub prediction_service_url: String,
    /// Infrastructure control plane URL; required with an external backend.
    pub scaling_backend_url: Option<String>,
    /// Timeout for monitoring, prediction and backend calls.
    pub request_timeout_ms: u64,
    /// Seconds between scheduled evaluation cycles.
    pub evaluation_interval_secs: u64,
    /// History store selection.
    pub history_backend: HistoryBackend,
    /// Static workload description.
    pub workload: WorkloadProfile,
    /// Scaling policy.
    pub scaling: ScalingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables (with defaults):
    /// - `DATABASE_PATH`: Path to `SQLite` database (default: `./data/autoscaler.db`)
    /// - `LOG_LEVEL`: Logging level (default: `info`)
    /// - `PROMETHEUS_URL`: Monitoring backend (default: `http://localhost:9090`)
    /// - `PREDICTION_SERVICE_URL`: Oracle (default: `http://localhost:8000`)
    /// - `SCALING_BACKEND_URL`: Infrastructure control plane (no default)
    /// - `REQUEST_TIMEOUT_MS`: Outbound call timeout (default: `10000`)
    /// - `EVALUATION_INTERVAL_SECS`: Cycle interval (default: `60`)
    /// - `HISTORY_BACKEND`: `sqlite` or `memory` (default: `sqlite`)
    /// - `APP_ID`, `APP_TYPE`, `ALLOCATED_CPU_CORES`, `ALLOCATED_MEMORY_GB`
    /// - Scaling policy variables, see [`ScalingConfig::from_env`]
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value cannot be parsed or fails
    /// validation (see [`validate_config`]).
    #[must_use = "configuration should be used"]
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let defaults = WorkloadProfile::default();
        let workload = WorkloadProfile {
            app_id: parse_env_u32("APP_ID", defaults.app_id)?,
            app_type: std::env::var("APP_TYPE").unwrap_or(defaults.app_type),
            allocated_cpu_cores: parse_env_u32("ALLOCATED_CPU_CORES", defaults.allocated_cpu_cores)?,
            allocated_memory_gb: parse_env_u32("ALLOCATED_MEMORY_GB", defaults.allocated_memory_gb)?,
        };

        let history_backend = match std::env::var("HISTORY_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => HistoryBackend::default(),
        };

        let config = Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into()),
            prometheus_url: std::env::var("PROMETHEUS_URL")
                .unwrap_or_else(|_| DEFAULT_PROMETHEUS_URL.into()),
            prediction_service_url: std::env::var("PREDICTION_SERVICE_URL")
                .unwrap_or_else(|_| DEFAULT_PREDICTION_SERVICE_URL.into()),
            scaling_backend_url: std::env::var("SCALING_BACKEND_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            request_timeout_ms: parse_env_u64("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?,
            evaluation_interval_secs: parse_env_u64(
                "EVALUATION_INTERVAL_SECS",
                DEFAULT_EVALUATION_INTERVAL_SECS,
            )?,
            history_backend,
            workload,
            scaling: ScalingConfig::from_env()?,
        };

        validate_config(&config)?;
        Ok(config)
    }
}

/// Parse an environment variable as u64, using a default if not set.
fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}

/// Parse an environment variable as u32, using a default if not set.
pub(crate) fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}

/// Parse an environment variable as f64, using a default if not set.
pub(crate) fn parse_env_f64(name: &str, default: f64) -> Result<f64, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ConfigError::InvalidValue {
                var: name.into(),
                reason: "must be a number".into(),
            })
    })
}

/// Parse an environment variable as a boolean, using a default if not set.
pub(crate) fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        match val.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var: name.into(),
                reason: "must be true or false".into(),
            }),
        }
    })
}
