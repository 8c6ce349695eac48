//! Scaling policy configuration.
//!
//! The policy is fixed at startup and read-only afterwards. The runtime
//! enable/disable switch lives on the controller; `enabled` here is only its
//! initial value.
//!
//! # Example
//!
//! ```
//! use ml_autoscaler::config::ScalingConfig;
//!
//! let config = ScalingConfig::default();
//! assert_eq!(config.min_instances, 1);
//! assert_eq!(config.max_instances, 10);
//! assert!((config.confidence_threshold - 0.7).abs() < f64::EPSILON);
//! assert_eq!(config.metrics_window, "5m");
//! ```

use super::{parse_env_bool, parse_env_f64, parse_env_u32};
use crate::error::ConfigError;

/// Default: autoscaling starts enabled.
pub const DEFAULT_ENABLED: bool = true;

/// Default lower instance bound.
pub const DEFAULT_MIN_INSTANCES: u32 = 1;

/// Default upper instance bound.
pub const DEFAULT_MAX_INSTANCES: u32 = 10;

/// Default minimum confidence required to act on a prediction.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Default PromQL range window.
pub const DEFAULT_METRICS_WINDOW: &str = "5m";

/// Default: simulate scaling locally.
pub const DEFAULT_USE_EXTERNAL_BACKEND: bool = false;

/// Scaling policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingConfig {
    /// Initial state of the enable switch.
    pub enabled: bool,
    /// Scale-down floor.
    pub min_instances: u32,
    /// Scale-up ceiling.
    pub max_instances: u32,
    /// Predictions below this confidence are logged but not executed.
    pub confidence_threshold: f64,
    /// Range window substituted into rate queries (e.g. `5m`).
    pub metrics_window: String,
    /// When set, the external backend is the source of truth for the
    /// instance count and the local register is never written.
    pub use_external_backend: bool,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ENABLED,
            min_instances: DEFAULT_MIN_INSTANCES,
            max_instances: DEFAULT_MAX_INSTANCES,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            metrics_window: DEFAULT_METRICS_WINDOW.to_string(),
            use_external_backend: DEFAULT_USE_EXTERNAL_BACKEND,
        }
    }
}

impl ScalingConfig {
    /// Load the scaling policy from environment variables.
    ///
    /// Environment variables:
    /// - `AUTOSCALING_ENABLED`: `true`/`false` (default: `true`)
    /// - `MIN_INSTANCES`: scale-down floor (default: 1)
    /// - `MAX_INSTANCES`: scale-up ceiling (default: 10)
    /// - `CONFIDENCE_THRESHOLD`: 0.0–1.0 (default: 0.7)
    /// - `METRICS_WINDOW`: PromQL duration (default: `5m`)
    /// - `USE_EXTERNAL_BACKEND`: `true`/`false` (default: `false`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable cannot be parsed.
    /// Range checks happen in [`super::validate_config`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: parse_env_bool("AUTOSCALING_ENABLED", DEFAULT_ENABLED)?,
            min_instances: parse_env_u32("MIN_INSTANCES", DEFAULT_MIN_INSTANCES)?,
            max_instances: parse_env_u32("MAX_INSTANCES", DEFAULT_MAX_INSTANCES)?,
            confidence_threshold: parse_env_f64(
                "CONFIDENCE_THRESHOLD",
                DEFAULT_CONFIDENCE_THRESHOLD,
            )?,
            metrics_window: std::env::var("METRICS_WINDOW")
                .unwrap_or_else(|_| DEFAULT_METRICS_WINDOW.into()),
            use_external_backend: parse_env_bool(
                "USE_EXTERNAL_BACKEND",
                DEFAULT_USE_EXTERNAL_BACKEND,
            )?,
        })
    }
}
