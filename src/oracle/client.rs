//! HTTP client for the remote prediction service.

#![allow(clippy::missing_errors_doc)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use super::types::{PredictionResponse, ScalingPrediction};
use crate::collector::MetricSnapshot;
use crate::error::OracleError;
use crate::traits::{PredictionService, TimeProvider};

/// Path of the scoring endpoint, relative to the service base URL.
pub const PREDICT_PATH: &str = "/predict_simple";

/// Prediction service client.
///
/// Predictions are stamped with the injected clock, not the response time.
#[derive(Clone)]
pub struct HttpPredictionClient {
    client: Client,
    base_url: String,
    timeout_ms: u64,
    clock: Arc<dyn TimeProvider>,
}

impl std::fmt::Debug for HttpPredictionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPredictionClient")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

impl HttpPredictionClient {
    /// Create a client for the service at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        timeout_ms: u64,
        clock: Arc<dyn TimeProvider>,
    ) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| OracleError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
            clock,
        })
    }

    /// Service base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn predict(&self, snapshot: &MetricSnapshot) -> Result<ScalingPrediction, OracleError> {
        let url = format!("{}{PREDICT_PATH}", self.base_url);
        let start = Instant::now();

        tracing::debug!(url = %url, timeout_ms = self.timeout_ms, "Requesting prediction");

        let response = self
            .client
            .post(&url)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| {
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                if e.is_timeout() {
                    tracing::error!(url = %url, elapsed_ms, "Prediction request timed out");
                    OracleError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    tracing::error!(url = %url, elapsed_ms, error = %e, "Prediction request failed");
                    OracleError::Network {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        tracing::debug!(
            url = %url,
            status = %status,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Prediction response received"
        );

        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
            });
        }

        let body: PredictionResponse =
            response
                .json()
                .await
                .map_err(|e| OracleError::Malformed {
                    message: format!("Failed to parse response: {e}"),
                })?;

        body.into_prediction(self.clock.now())
    }
}
