//! Prometheus HTTP API response shapes.

use serde::Deserialize;

/// Envelope of `GET /api/v1/query`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    /// `success` or `error`.
    pub status: String,
    /// Present on success.
    #[serde(default)]
    pub data: Option<QueryData>,
    /// Present on error.
    #[serde(default)]
    pub error: Option<String>,
}

/// Result payload.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryData {
    /// `vector`, `scalar`, `matrix` or `string`.
    #[serde(rename = "resultType", default)]
    pub result_type: String,
    /// Samples for a `vector`, or the single `scalar` value.
    #[serde(default)]
    pub result: QueryResult,
}

/// Instant-query result body. The shape differs by `resultType`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// `[{"metric": {..}, "value": [t, "v"]}, ..]`
    Vector(Vec<VectorSample>),
    /// `[t, "v"]`
    Scalar((f64, String)),
}

impl Default for QueryResult {
    fn default() -> Self {
        Self::Vector(Vec::new())
    }
}

/// One instant-vector sample.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorSample {
    /// `[unix_time, "value"]`.
    pub value: (f64, String),
}

impl QueryResponse {
    /// First sample value, if the query succeeded and returned one.
    ///
    /// Prometheus encodes sample values as strings; `NaN` and infinities
    /// are treated as absent.
    #[must_use]
    pub fn first_value(&self) -> Option<f64> {
        if self.status != "success" {
            return None;
        }
        let raw = match &self.data.as_ref()?.result {
            QueryResult::Vector(samples) => &samples.first()?.value.1,
            QueryResult::Scalar((_, value)) => value,
        };
        raw.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}
