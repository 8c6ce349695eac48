//! Storage backend.
//!
//! This module provides the `SQLite` persistence used by the autoscaler:
//! - the append-only decision log (`auto_scaling_decisions`)
//! - the simulated instance count register (`instance_counts`)
//! - the metric sample history (`metric_samples`)
//!
//! # Architecture
//!
//! The storage layer uses `SQLite` with the `sqlx` crate for async operations.
//! The implementation is split across submodules:
//! - `core`: Pool management, migrations, and helper functions
//! - `decisions`: Decision log operations
//! - `instance`: Instance count register
//! - `samples`: Metric sample history
//! - `trait_impl`: `DecisionStore`, `CountRegister` and `HistoryStore`
//!
//! # Example
//!
//! ```ignore
//! use ml_autoscaler::storage::SqliteStorage;
//!
//! let storage = SqliteStorage::new("./data/autoscaler.db").await?;
//! storage.set_instance_count(2).await?;
//! ```

mod core;
mod decisions;
mod instance;
mod samples;
mod trait_impl;

pub use self::core::SqliteStorage;
