//! ML Autoscaler
//!
//! An autoscaling control loop driven by a remote prediction service, with a
//! deterministic rule-based fallback.
//!
//! # Features
//!
//! - Prometheus telemetry with per-field defaults when data is missing
//! - Historical 1h/4h/24h averages from a sample store
//! - Remote prediction with circuit breaker and rule-table fallback
//! - Confidence gate and instance bounds before any scaling action
//! - Simulated or HTTP control-plane scaling backends
//! - `SQLite` decision log
//!
//! # Quick Start
//!
//! ```bash
//! PROMETHEUS_URL=http://prom:9090 PREDICTION_SERVICE_URL=http://oracle:8000 ./ml-autoscaler
//! ```
//!
//! # Architecture
//!
//! ```text
//!  Prometheus ──▶ MetricCollector ──▶ PredictionOracle ──▶ gate ──▶ ScalingExecutor ──▶ backend
//!                      │                    │ (fallback)                   │
//!                      ▼                    ▼                              ▼
//!                HistoryStore          DecisionLog ◀──────────────  InstanceCountStore
//!                                        (SQLite)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod backend;
pub mod collector;
pub mod config;
pub mod controller;
pub mod decision;
pub mod error;
pub mod executor;
pub mod instance;
pub mod monitoring;
pub mod oracle;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod test_utils;
