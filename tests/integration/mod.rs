//! Integration tests for the ML autoscaler.
//!
//! These tests drive the controller against mock HTTP services:
//! - Full evaluation cycles with the simulated backend
//! - Cycles against an HTTP control plane
//! - Monitoring and prediction outages

mod common;
mod error_recovery;
mod evaluation_cycle;
mod external_backend;
