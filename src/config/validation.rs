//! Configuration validation.
//!
//! This module provides validation logic for configuration values,
//! ensuring they are within acceptable ranges.

use super::Config;
use crate::error::ConfigError;

/// Minimum allowed timeout in milliseconds (100 ms).
pub const MIN_TIMEOUT_MS: u64 = 100;

/// Maximum allowed timeout in milliseconds (5 minutes).
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Minimum evaluation interval in seconds.
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Maximum evaluation interval in seconds (1 hour).
pub const MAX_INTERVAL_SECS: u64 = 3600;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if any value is out of range:
/// - `REQUEST_TIMEOUT_MS` must be between 100 and 300000
/// - `EVALUATION_INTERVAL_SECS` must be between 1 and 3600
/// - `MAX_INSTANCES` must be at least 1 and not below `MIN_INSTANCES`
/// - `CONFIDENCE_THRESHOLD` must be within 0.0–1.0
/// - `METRICS_WINDOW` must look like `30s`, `5m`, `1h` or `1d`
/// - URLs must use `http://` or `https://`
///
/// Returns [`ConfigError::MissingRequired`] if the external backend is
/// enabled without `SCALING_BACKEND_URL`.
#[must_use = "validation result should be checked"]
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.request_timeout_ms < MIN_TIMEOUT_MS || config.request_timeout_ms > MAX_TIMEOUT_MS {
        return Err(ConfigError::InvalidValue {
            var: "REQUEST_TIMEOUT_MS".into(),
            reason: format!("must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS} ms"),
        });
    }

    if config.evaluation_interval_secs < MIN_INTERVAL_SECS
        || config.evaluation_interval_secs > MAX_INTERVAL_SECS
    {
        return Err(ConfigError::InvalidValue {
            var: "EVALUATION_INTERVAL_SECS".into(),
            reason: format!("must be between {MIN_INTERVAL_SECS} and {MAX_INTERVAL_SECS} s"),
        });
    }

    let scaling = &config.scaling;
    if scaling.max_instances == 0 {
        return Err(ConfigError::InvalidValue {
            var: "MAX_INSTANCES".into(),
            reason: "must be at least 1".into(),
        });
    }

    if scaling.min_instances > scaling.max_instances {
        return Err(ConfigError::InvalidValue {
            var: "MIN_INSTANCES".into(),
            reason: format!(
                "must not exceed MAX_INSTANCES ({} > {})",
                scaling.min_instances, scaling.max_instances
            ),
        });
    }

    if !(0.0..=1.0).contains(&scaling.confidence_threshold) {
        return Err(ConfigError::InvalidValue {
            var: "CONFIDENCE_THRESHOLD".into(),
            reason: "must be between 0.0 and 1.0".into(),
        });
    }

    if !is_prometheus_duration(&scaling.metrics_window) {
        return Err(ConfigError::InvalidValue {
            var: "METRICS_WINDOW".into(),
            reason: format!(
                "'{}' is not a duration like 30s, 5m, 1h or 1d",
                scaling.metrics_window
            ),
        });
    }

    check_url("PROMETHEUS_URL", &config.prometheus_url)?;
    check_url("PREDICTION_SERVICE_URL", &config.prediction_service_url)?;

    match (&config.scaling_backend_url, scaling.use_external_backend) {
        (None, true) => {
            return Err(ConfigError::MissingRequired {
                var: "SCALING_BACKEND_URL".into(),
            });
        }
        (Some(url), _) => check_url("SCALING_BACKEND_URL", url)?,
        (None, false) => {}
    }

    Ok(())
}

fn check_url(var: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            var: var.into(),
            reason: "must start with http:// or https://".into(),
        })
    }
}

fn is_prometheus_duration(window: &str) -> bool {
    let Some(unit) = window.chars().last() else {
        return false;
    };
    let digits = &window[..window.len() - unit.len_utf8()];
    matches!(unit, 's' | 'm' | 'h' | 'd')
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && digits.parse::<u64>().is_ok_and(|n| n > 0)
}
