//! Prometheus query client.
//!
//! [`PrometheusClient`] evaluates instant queries through the HTTP API and
//! reduces the answer to a single scalar: the value of the first sample.

#![allow(clippy::missing_errors_doc)]

mod types;

pub use types::{QueryData, QueryResponse, QueryResult, VectorSample};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use crate::error::CollectionError;
use crate::traits::MonitoringSource;

/// Path of the instant query endpoint.
pub const QUERY_PATH: &str = "/api/v1/query";

/// Prometheus HTTP API client.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl PrometheusClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, CollectionError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| CollectionError::Transport {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
        })
    }

    /// Server base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MonitoringSource for PrometheusClient {
    async fn query(&self, expr: &str) -> Result<f64, CollectionError> {
        let url = format!("{}{QUERY_PATH}", self.base_url);
        let start = Instant::now();

        let response = self
            .client
            .get(&url)
            .query(&[("query", expr)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CollectionError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    CollectionError::Transport {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        tracing::trace!(
            query = expr,
            status = %status,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Prometheus query answered"
        );

        if !status.is_success() {
            return Err(CollectionError::Status {
                status: status.as_u16(),
            });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| CollectionError::Malformed {
                message: format!("Failed to parse response: {e}"),
            })?;

        body.first_value().ok_or_else(|| CollectionError::NoData {
            query: expr.to_string(),
        })
    }
}
