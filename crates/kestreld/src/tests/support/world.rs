//! BDD test world: a daemon over a recording backend plus the last lifecycle result.

use std::cell::RefCell;
use std::sync::Arc;

use kestrel_config::DaemonConfig;
use tempfile::TempDir;

use crate::daemon::{Daemon, DaemonError, LifecycleState, StartupContext};
use crate::telemetry::LogHandle;
use crate::testing::RecordingBackend;

use super::reporter::RecordingHealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    pub backend: RecordingBackend,
    pub reporter: Arc<RecordingHealthReporter>,
    pub config: DaemonConfig,
    daemon: Daemon<RecordingBackend>,
    storage: TempDir,
    last_result: Option<Result<(), DaemonError>>,
}

impl TestWorld {
    /// Builds a world around a freshly created daemon.
    #[must_use]
    pub fn new() -> Self {
        let backend = RecordingBackend::default();
        let reporter = Arc::new(RecordingHealthReporter::default());
        let daemon = Daemon::new(backend.clone(), reporter.clone(), LogHandle::detached(4096));
        Self {
            backend,
            reporter,
            config: DaemonConfig::default(),
            daemon,
            storage: TempDir::new().expect("failed to create storage directory"),
            last_result: None,
        }
    }

    /// Assigns the temporary storage root.
    pub fn assign_storage(&mut self) {
        let path = self.storage.path().to_path_buf();
        self.last_result = Some(self.daemon.set_storage_path(path));
    }

    /// Runs `initialize` with a fresh context.
    pub fn initialise(&mut self) {
        let config = self.config.clone();
        self.last_result = Some(self.daemon.initialize(&StartupContext::new(), &config));
    }

    /// Runs `shutdown` with a fresh context.
    pub fn shut_down(&mut self) {
        self.last_result = Some(self.daemon.shutdown(&StartupContext::new()));
    }

    /// Current daemon state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.daemon.state()
    }

    /// Result of the most recent lifecycle operation.
    #[must_use]
    pub fn last_result(&self) -> Option<&Result<(), DaemonError>> {
        self.last_result.as_ref()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
