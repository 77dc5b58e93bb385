//! In-memory collaborators for tests of crates driving the daemon.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kestrel_config::DaemonConfig;

use crate::daemon::{Backend, BackendStartupError, BackendStep, StartupContext};
use crate::events::EventPublisher;

/// Call observed by the recording backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    /// A step was started.
    Start(BackendStep),
    /// A step was stopped.
    Stop(BackendStep),
}

/// Backend that records calls and supports injected failures.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<BackendState>>,
}

#[derive(Debug, Default)]
struct BackendState {
    calls: Vec<BackendCall>,
    start_failures: HashMap<BackendStep, String>,
    stop_failures: HashMap<BackendStep, String>,
    network_events: Option<EventPublisher>,
}

impl RecordingBackend {
    /// Configures the backend to fail when starting `step`.
    pub fn fail_on(&self, step: BackendStep, message: impl Into<String>) {
        let mut state = self.lock();
        state.start_failures.insert(step, message.into());
    }

    /// Configures the backend to fail when stopping `step`.
    pub fn fail_stop_on(&self, step: BackendStep, message: impl Into<String>) {
        let mut state = self.lock();
        state.stop_failures.insert(step, message.into());
    }

    /// Returns every recorded call.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Steps that were started, in order.
    #[must_use]
    pub fn started(&self) -> Vec<BackendStep> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Start(step) => Some(step),
                BackendCall::Stop(_) => None,
            })
            .collect()
    }

    /// Steps that were stopped, in order.
    #[must_use]
    pub fn stopped(&self) -> Vec<BackendStep> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Stop(step) => Some(step),
                BackendCall::Start(_) => None,
            })
            .collect()
    }

    /// Publisher handed to the network step, once it has started.
    #[must_use]
    pub fn network_events(&self) -> Option<EventPublisher> {
        self.lock().network_events.clone()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_start(&self, step: BackendStep) -> Result<(), BackendStartupError> {
        let failure = {
            let mut state = self.lock();
            state.calls.push(BackendCall::Start(step));
            state.start_failures.get(&step).cloned()
        };
        match failure {
            Some(message) => Err(BackendStartupError::new(step, message)),
            None => Ok(()),
        }
    }
}

impl Backend for RecordingBackend {
    fn open_database(
        &mut self,
        _ctx: &StartupContext,
        _storage: &Path,
        _config: &DaemonConfig,
    ) -> Result<(), BackendStartupError> {
        self.record_start(BackendStep::Database)
    }

    fn start_network(
        &mut self,
        _ctx: &StartupContext,
        _config: &DaemonConfig,
        events: &EventPublisher,
    ) -> Result<(), BackendStartupError> {
        self.lock().network_events = Some(events.clone());
        self.record_start(BackendStep::Network)
    }

    fn bind_rpc(
        &mut self,
        _ctx: &StartupContext,
        _config: &DaemonConfig,
    ) -> Result<(), BackendStartupError> {
        self.record_start(BackendStep::Rpc)
    }

    fn stop(&mut self, _ctx: &StartupContext, step: BackendStep) -> Result<(), BackendStartupError> {
        let failure = {
            let mut state = self.lock();
            state.calls.push(BackendCall::Stop(step));
            state.stop_failures.get(&step).cloned()
        };
        match failure {
            Some(message) => Err(BackendStartupError::new(step, message)),
            None => Ok(()),
        }
    }
}
