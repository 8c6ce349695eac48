//! Scaling backends.
//!
//! - [`SimulatedBackend`]: logs the request and succeeds; the local count
//!   register stays authoritative
//! - [`HttpScalingBackend`]: drives a generic HTTP control plane that owns
//!   the live instance count

mod http;

pub use http::{HttpScalingBackend, InstancesResponse, ScaleRequest, ScaleResponse};

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::collector::DEFAULT_INSTANCE_COUNT;
use crate::error::BackendError;
use crate::traits::ScalingBackend;

/// In-process backend that accepts every request.
#[derive(Debug)]
pub struct SimulatedBackend {
    last_target: AtomicU32,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBackend {
    /// Create a simulated backend starting at one instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_target: AtomicU32::new(DEFAULT_INSTANCE_COUNT),
        }
    }

    /// Most recent target accepted.
    #[must_use]
    pub fn last_target(&self) -> u32 {
        self.last_target.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScalingBackend for SimulatedBackend {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn current_count(&self) -> Result<u32, BackendError> {
        Ok(self.last_target())
    }

    async fn scale_to(&self, target: u32) -> Result<bool, BackendError> {
        let previous = self.last_target.swap(target, Ordering::SeqCst);
        tracing::info!(previous, target, "Simulated scaling applied");
        Ok(true)
    }
}
