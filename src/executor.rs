//! Scaling executor.
//!
//! Applies one action to the backend, one instance at a time, within the
//! configured bounds. Actions at a bound are successful no-ops. A refused
//! or failed backend call leaves the count unchanged and is not retried.

use std::sync::Arc;

use crate::instance::InstanceCountStore;
use crate::oracle::ScalingAction;
use crate::traits::ScalingBackend;

/// Result of applying an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Whether the action completed (no-ops count as success).
    pub success: bool,
    /// Count before the action.
    pub previous_count: u32,
    /// Count after the action.
    pub new_count: u32,
}

impl ExecutionOutcome {
    /// An outcome that leaves `count` unchanged.
    #[must_use]
    pub const fn unchanged(count: u32, success: bool) -> Self {
        Self {
            success,
            previous_count: count,
            new_count: count,
        }
    }

    /// Whether the instance count moved.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.previous_count != self.new_count
    }
}

/// Executes scaling actions.
pub struct ScalingExecutor {
    backend: Arc<dyn ScalingBackend>,
    store: InstanceCountStore,
    min_instances: u32,
    max_instances: u32,
}

impl std::fmt::Debug for ScalingExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalingExecutor")
            .field("backend", &self.backend.name())
            .field("store", &self.store)
            .field("min_instances", &self.min_instances)
            .field("max_instances", &self.max_instances)
            .finish()
    }
}

impl ScalingExecutor {
    /// Create an executor for `[min_instances, max_instances]`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn ScalingBackend>,
        store: InstanceCountStore,
        min_instances: u32,
        max_instances: u32,
    ) -> Self {
        Self {
            backend,
            store,
            min_instances,
            max_instances,
        }
    }

    /// Name of the backend in use.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Apply `action` starting from `current` instances.
    pub async fn apply(&self, action: ScalingAction, current: u32) -> ExecutionOutcome {
        let target = match action {
            ScalingAction::Maintain => return ExecutionOutcome::unchanged(current, true),
            ScalingAction::ScaleUp if current >= self.max_instances => {
                tracing::info!(current, max = self.max_instances, "Already at maximum instances");
                return ExecutionOutcome::unchanged(current, true);
            }
            ScalingAction::ScaleDown if current <= self.min_instances => {
                tracing::info!(current, min = self.min_instances, "Already at minimum instances");
                return ExecutionOutcome::unchanged(current, true);
            }
            ScalingAction::ScaleUp => current + 1,
            ScalingAction::ScaleDown => current - 1,
        };

        match self.backend.scale_to(target).await {
            Ok(true) => {
                self.store.write(target).await;
                tracing::info!(
                    event = "scaling_notification",
                    action = %action,
                    backend = self.backend.name(),
                    previous = current,
                    new = target,
                    "Scaled from {current} to {target} instances"
                );
                ExecutionOutcome {
                    success: true,
                    previous_count: current,
                    new_count: target,
                }
            }
            Ok(false) => {
                tracing::warn!(
                    action = %action,
                    backend = self.backend.name(),
                    target,
                    "Backend refused scaling request"
                );
                ExecutionOutcome::unchanged(current, false)
            }
            Err(error) => {
                tracing::error!(
                    action = %action,
                    backend = self.backend.name(),
                    target,
                    error = %error,
                    "Scaling request failed"
                );
                ExecutionOutcome::unchanged(current, false)
            }
        }
    }
}
