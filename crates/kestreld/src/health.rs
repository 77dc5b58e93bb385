//! Structured health reporting for daemon lifecycle events.

use std::path::Path;
use std::sync::Arc;

use crate::daemon::{BackendStartupError, BackendStep, DaemonError, LifecycleState};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked once the storage root has been assigned.
    fn storage_assigned(&self, path: &Path);

    /// Invoked before the backend sub-steps run.
    fn initialisation_starting(&self);

    /// Invoked before a sub-step starts.
    fn step_starting(&self, step: BackendStep);

    /// Invoked after a sub-step completes.
    fn step_ready(&self, step: BackendStep);

    /// Invoked when a sub-step fails to start.
    fn step_failed(&self, error: &BackendStartupError);

    /// Invoked when a sub-step fails to release its resources.
    fn step_stop_failed(&self, error: &BackendStartupError);

    /// Invoked when the lifecycle reaches a new state.
    fn state_changed(&self, from: LifecycleState, to: LifecycleState);

    /// Invoked when a lifecycle operation is rejected or fails.
    fn lifecycle_failed(&self, error: &DaemonError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn storage_assigned(&self, path: &Path) {
        (**self).storage_assigned(path);
    }

    fn initialisation_starting(&self) {
        (**self).initialisation_starting();
    }

    fn step_starting(&self, step: BackendStep) {
        (**self).step_starting(step);
    }

    fn step_ready(&self, step: BackendStep) {
        (**self).step_ready(step);
    }

    fn step_failed(&self, error: &BackendStartupError) {
        (**self).step_failed(error);
    }

    fn step_stop_failed(&self, error: &BackendStartupError) {
        (**self).step_stop_failed(error);
    }

    fn state_changed(&self, from: LifecycleState, to: LifecycleState) {
        (**self).state_changed(from, to);
    }

    fn lifecycle_failed(&self, error: &DaemonError) {
        (**self).lifecycle_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn storage_assigned(&self, path: &Path) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "storage_assigned",
            path = %path.display(),
            "daemon storage root assigned"
        );
    }

    fn initialisation_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "initialisation_starting",
            "initialising daemon"
        );
    }

    fn step_starting(&self, step: BackendStep) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "step_starting",
            step = %step,
            "starting daemon step"
        );
    }

    fn step_ready(&self, step: BackendStep) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "step_ready",
            step = %step,
            "daemon step ready"
        );
    }

    fn step_failed(&self, error: &BackendStartupError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "step_failed",
            step = %error.step,
            message = %error.message(),
            error = ?error,
            "daemon step failed to start"
        );
    }

    fn step_stop_failed(&self, error: &BackendStartupError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "step_stop_failed",
            step = %error.step,
            message = %error.message(),
            "daemon step failed to stop cleanly"
        );
    }

    fn state_changed(&self, from: LifecycleState, to: LifecycleState) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "state_changed",
            from = %from,
            to = %to,
            "daemon lifecycle transition"
        );
    }

    fn lifecycle_failed(&self, error: &DaemonError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "lifecycle_failed",
            error = %error,
            "daemon lifecycle operation failed"
        );
    }
}
