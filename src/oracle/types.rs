//! Prediction types.
//!
//! - [`ScalingAction`]: the three possible decisions
//! - [`PredictionSource`]: whether the remote oracle or the fallback answered
//! - [`ScalingPrediction`]: validated prediction used by the controller
//! - [`PredictionResponse`]: raw wire shape returned by the oracle

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// A scaling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingAction {
    /// Add one instance.
    ScaleUp,
    /// Remove one instance.
    ScaleDown,
    /// Leave the instance count unchanged.
    Maintain,
}

impl ScalingAction {
    /// Every action, in wire order.
    pub const ALL: [Self; 3] = [Self::ScaleUp, Self::ScaleDown, Self::Maintain];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScaleUp => "scale_up",
            Self::ScaleDown => "scale_down",
            Self::Maintain => "maintain",
        }
    }
}

impl fmt::Display for ScalingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalingAction {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scale_up" => Ok(Self::ScaleUp),
            "scale_down" => Ok(Self::ScaleDown),
            "maintain" => Ok(Self::Maintain),
            other => Err(OracleError::Malformed {
                message: format!("unknown action '{other}'"),
            }),
        }
    }
}

/// Which path produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// The remote prediction service.
    Oracle,
    /// The local rule table.
    Fallback,
}

/// A validated scaling prediction.
///
/// `confidence` is always within `[0.0, 1.0]`; the only way to build one is
/// through [`ScalingPrediction::new`], which rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPrediction {
    /// Recommended action.
    pub action: ScalingAction,
    /// Confidence in `action`.
    pub confidence: f64,
    /// Score per action name.
    pub probabilities: BTreeMap<String, f64>,
    /// Which path answered.
    pub produced_by: PredictionSource,
    /// When the prediction was made.
    pub timestamp: DateTime<Utc>,
}

impl ScalingPrediction {
    /// Build a prediction, enforcing the confidence range.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Malformed`] if `confidence` is not a finite
    /// value in `[0.0, 1.0]`.
    pub fn new(
        action: ScalingAction,
        confidence: f64,
        probabilities: BTreeMap<String, f64>,
        produced_by: PredictionSource,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, OracleError> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(OracleError::Malformed {
                message: format!("confidence {confidence} outside [0, 1]"),
            });
        }

        Ok(Self {
            action,
            confidence,
            probabilities,
            produced_by,
            timestamp,
        })
    }

    /// Whether the fallback rule table produced this prediction.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.produced_by == PredictionSource::Fallback
    }
}

/// Response body of `POST /predict_simple`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResponse {
    /// Action name.
    pub action: String,
    /// Confidence in the action.
    pub confidence: f64,
    /// Optional per-action scores.
    #[serde(default)]
    pub probabilities: BTreeMap<String, f64>,
    /// Optional RFC 3339 timestamp.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl PredictionResponse {
    /// Validate the wire response and convert it into a prediction.
    ///
    /// A missing or unparseable timestamp is replaced by `received_at`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Malformed`] for an unknown action or an
    /// out-of-range confidence.
    pub fn into_prediction(
        self,
        received_at: DateTime<Utc>,
    ) -> Result<ScalingPrediction, OracleError> {
        let action: ScalingAction = self.action.parse()?;
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map_or(received_at, |ts| ts.with_timezone(&Utc));

        ScalingPrediction::new(
            action,
            self.confidence,
            self.probabilities,
            PredictionSource::Oracle,
            timestamp,
        )
    }
}
