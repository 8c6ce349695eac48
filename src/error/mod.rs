//! Error types for the autoscaler.
//!
//! This module defines a hierarchical error system:
//! - [`AppError`]: Top-level application errors
//! - [`CollectionError`]: Per-field telemetry failures
//! - [`OracleError`]: Prediction service failures
//! - [`BackendError`]: Infrastructure scaling failures
//! - [`StorageError`]: Database operation errors
//! - [`ConfigError`]: Configuration errors
//!
//! All errors implement `Send + Sync` for async compatibility.

use thiserror::Error;

/// Top-level application error.
///
/// Only cycle-fatal conditions surface as an `AppError`; degradations
/// (missing telemetry, oracle fallback, store outages) are absorbed by the
/// component that owns them.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Monitoring client error.
    #[error("Monitoring error: {0}")]
    Collection(#[from] CollectionError),

    /// Prediction service error.
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Scaling backend error.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure to obtain a single telemetry field.
///
/// Every variant resolves to the field's documented default in the
/// collector; none of them abort a snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// The backend answered but had no sample for the query.
    #[error("No data for query: {query}")]
    NoData {
        /// The query expression.
        query: String,
    },

    /// The monitoring request timed out.
    #[error("Monitoring query timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Transport-level failure (connection refused, DNS, TLS).
    #[error("Monitoring transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// Non-success HTTP status.
    #[error("Monitoring backend returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Response body could not be interpreted.
    #[error("Malformed monitoring response: {message}")]
    Malformed {
        /// Description of what was wrong.
        message: String,
    },

    /// Historical sample lookup failed.
    #[error("History unavailable: {message}")]
    History {
        /// Description of the failure.
        message: String,
    },
}

/// Prediction service errors.
///
/// Any of these sends the oracle down the rule-based fallback path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Request timed out.
    #[error("Prediction request timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Network communication error.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Non-2xx response.
    #[error("Prediction service returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Response could not be mapped onto a prediction.
    #[error("Malformed prediction response: {message}")]
    Malformed {
        /// Description of what was wrong.
        message: String,
    },

    /// Remote calls are suspended after repeated failures.
    #[error("Prediction circuit open")]
    CircuitOpen,
}

/// Infrastructure backend errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Request timed out.
    #[error("Backend request timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Network communication error.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Non-2xx response.
    #[error("Backend returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (may be empty).
        body: String,
    },

    /// Response could not be interpreted.
    #[error("Malformed backend response: {message}")]
    Malformed {
        /// Description of what was wrong.
        message: String,
    },
}

/// Storage errors.
///
/// These errors represent failures in database operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Failed to connect to the database.
    #[error("Database connection failed: {message}")]
    ConnectionFailed {
        /// Description of the connection failure.
        message: String,
    },

    /// A database query failed.
    #[error("Query failed: {query} - {message}")]
    QueryFailed {
        /// The query that failed (may be truncated).
        query: String,
        /// Description of the failure.
        message: String,
    },

    /// Database migration failed.
    #[error("Migration failed: {version} - {message}")]
    MigrationFailed {
        /// The migration version that failed.
        version: String,
        /// Description of the failure.
        message: String,
    },

    /// A stored value could not be encoded or decoded.
    #[error("Serialization failed: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },

    /// Internal storage error.
    #[error("Internal storage error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

/// Configuration errors.
///
/// These errors represent failures in configuration loading and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required configuration is missing.
    #[error("Missing required: {var}")]
    MissingRequired {
        /// The missing variable name.
        var: String,
    },

    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },
}
