//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::path::Path;
use std::sync::Mutex;

use crate::daemon::{BackendStartupError, BackendStep, DaemonError, LifecycleState};
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Storage root assigned.
    StorageAssigned,
    /// Initialisation started.
    InitialisationStarting,
    /// Step start initiated.
    StepStarting(BackendStep),
    /// Step started successfully.
    StepReady(BackendStep),
    /// Step failed to start with a message.
    StepFailed { step: BackendStep, message: String },
    /// Step failed to stop.
    StepStopFailed(BackendStep),
    /// Lifecycle transition.
    StateChanged(LifecycleState, LifecycleState),
    /// Lifecycle operation failed with an error description.
    LifecycleFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Lifecycle states entered, in order.
    #[must_use]
    pub fn states(&self) -> Vec<LifecycleState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::StateChanged(_, to) => Some(to),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn storage_assigned(&self, _path: &Path) {
        self.record(HealthEvent::StorageAssigned);
    }

    fn initialisation_starting(&self) {
        self.record(HealthEvent::InitialisationStarting);
    }

    fn step_starting(&self, step: BackendStep) {
        self.record(HealthEvent::StepStarting(step));
    }

    fn step_ready(&self, step: BackendStep) {
        self.record(HealthEvent::StepReady(step));
    }

    fn step_failed(&self, error: &BackendStartupError) {
        self.record(HealthEvent::StepFailed {
            step: error.step,
            message: error.message().to_owned(),
        });
    }

    fn step_stop_failed(&self, error: &BackendStartupError) {
        self.record(HealthEvent::StepStopFailed(error.step));
    }

    fn state_changed(&self, from: LifecycleState, to: LifecycleState) {
        self.record(HealthEvent::StateChanged(from, to));
    }

    fn lifecycle_failed(&self, error: &DaemonError) {
        self.record(HealthEvent::LifecycleFailed(error.to_string()));
    }
}
