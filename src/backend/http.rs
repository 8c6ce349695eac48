//! HTTP control-plane backend.
//!
//! Contract:
//! - `GET {base}/instances` returns `{"count": n}`
//! - `POST {base}/scale` with `{"target": n}` returns 2xx and optionally
//!   `{"success": bool}`; a missing flag or empty body counts as success

#![allow(clippy::missing_errors_doc)]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::traits::ScalingBackend;

/// Body of `GET /instances`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InstancesResponse {
    /// Running instances.
    pub count: u32,
}

/// Body of `POST /scale`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScaleRequest {
    /// Desired instance count.
    pub target: u32,
}

/// Optional body returned by `POST /scale`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScaleResponse {
    /// Whether the change was accepted.
    #[serde(default = "accepted")]
    pub success: bool,
}

const fn accepted() -> bool {
    true
}

/// Generic HTTP scaling backend.
#[derive(Debug, Clone)]
pub struct HttpScalingBackend {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl HttpScalingBackend {
    /// Create a backend for the control plane at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| BackendError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
        })
    }

    fn transport_error(&self, url: &str, e: &reqwest::Error) -> BackendError {
        if e.is_timeout() {
            tracing::error!(url = %url, timeout_ms = self.timeout_ms, "Backend request timed out");
            BackendError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            tracing::error!(url = %url, error = %e, "Backend request failed");
            BackendError::Network {
                message: e.to_string(),
            }
        }
    }

    async fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(BackendError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl ScalingBackend for HttpScalingBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn current_count(&self) -> Result<u32, BackendError> {
        let url = format!("{}/instances", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(&url, &e))?;

        let body: InstancesResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Malformed {
                message: format!("Failed to parse instance count: {e}"),
            })?;

        Ok(body.count)
    }

    async fn scale_to(&self, target: u32) -> Result<bool, BackendError> {
        let url = format!("{}/scale", self.base_url);
        tracing::debug!(url = %url, target, "Requesting scale change");

        let response = self
            .client
            .post(&url)
            .json(&ScaleRequest { target })
            .send()
            .await
            .map_err(|e| self.transport_error(&url, &e))?;

        let text = Self::check_status(response)
            .await?
            .text()
            .await
            .map_err(|e| BackendError::Malformed {
                message: format!("Failed to read scale response: {e}"),
            })?;

        if text.trim().is_empty() {
            return Ok(true);
        }

        let body: ScaleResponse =
            serde_json::from_str(&text).map_err(|e| BackendError::Malformed {
                message: format!("Failed to parse scale response: {e}"),
            })?;

        Ok(body.success)
    }
}
