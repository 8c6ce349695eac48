//! Instance count store.
//!
//! In local mode the count lives in a persistent register that the executor
//! updates after every successful scaling action. In external mode the
//! scaling backend is authoritative and writes are skipped.
//!
//! Reads never fail: an unknown or unreadable count is reported as 1.

use std::sync::Arc;

use crate::collector::DEFAULT_INSTANCE_COUNT;
use crate::traits::{CountRegister, ScalingBackend};

/// Source of truth for the current instance count.
#[derive(Clone)]
pub enum InstanceCountStore {
    /// Local persistent register.
    Local(Arc<dyn CountRegister>),
    /// The scaling backend reports the live count.
    External(Arc<dyn ScalingBackend>),
}

impl std::fmt::Debug for InstanceCountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(_) => f.write_str("InstanceCountStore::Local"),
            Self::External(backend) => {
                write!(f, "InstanceCountStore::External({})", backend.name())
            }
        }
    }
}

impl InstanceCountStore {
    /// Whether the backend is authoritative.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }

    /// Current instance count, 1 when unknown.
    pub async fn read(&self) -> u32 {
        match self {
            Self::Local(register) => match register.load_count().await {
                Ok(Some(count)) => count,
                Ok(None) => DEFAULT_INSTANCE_COUNT,
                Err(error) => {
                    tracing::warn!(error = %error, "Instance count unreadable, assuming 1");
                    DEFAULT_INSTANCE_COUNT
                }
            },
            Self::External(backend) => match backend.current_count().await {
                Ok(count) => count,
                Err(error) => {
                    tracing::warn!(
                        backend = backend.name(),
                        error = %error,
                        "Backend instance count unavailable, assuming 1"
                    );
                    DEFAULT_INSTANCE_COUNT
                }
            },
        }
    }

    /// Record a new count. No-op in external mode.
    pub async fn write(&self, count: u32) {
        match self {
            Self::Local(register) => {
                if let Err(error) = register.store_count(count).await {
                    tracing::warn!(count, error = %error, "Failed to persist instance count");
                }
            }
            Self::External(backend) => {
                tracing::debug!(
                    backend = backend.name(),
                    count,
                    "Skipping instance count write, backend is authoritative"
                );
            }
        }
    }
}
