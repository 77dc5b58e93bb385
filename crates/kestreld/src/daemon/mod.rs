//! Daemon lifecycle.
//!
//! [`Daemon`] owns one [`Backend`] for the lifetime of the process and walks
//! it through `Created → StoragePathSet → Initialized → Running → Stopped`.
//! Initialisation runs the database, network and RPC steps in order and stops
//! the ones that already started, newest first, when a later step fails. The
//! daemon then stays in [`LifecycleState::Failed`]; there is no retry.

mod backend;
mod context;
mod local;
mod state;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kestrel_config::DaemonConfig;
use thiserror::Error;

use crate::events::{self, DaemonEvent, EventPublisher, EventSubscription};
use crate::health::HealthReporter;
use crate::telemetry::LogHandle;

#[cfg(test)]
pub(crate) use backend::MockBackend;
pub use backend::{Backend, BackendStartupError, BackendStep, BackendStepParseError};
pub use context::{ContextError, StartupContext};
pub use local::LocalBackend;
pub use state::{DaemonStatus, LifecycleState};

const DAEMON_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::daemon");

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The operation is not valid in the current state.
    #[error("cannot {operation} while daemon is {from}")]
    InvalidLifecycleTransition {
        /// State the daemon was in.
        from: LifecycleState,
        /// Rejected operation.
        operation: &'static str,
    },
    /// A sub-step failed during initialisation.
    #[error("daemon initialisation failed at {step}: {source}")]
    Init {
        /// Failing step.
        step: BackendStep,
        /// Backend error.
        #[source]
        source: BackendStartupError,
    },
    /// A sub-step failed to stop during shutdown.
    #[error("daemon shutdown failed at {step}: {source}")]
    Shutdown {
        /// First step that failed to stop.
        step: BackendStep,
        /// Backend error.
        #[source]
        source: BackendStartupError,
    },
}

impl DaemonError {
    /// Step named by the error, when it concerns one.
    #[must_use]
    pub const fn step(&self) -> Option<BackendStep> {
        match self {
            Self::InvalidLifecycleTransition { .. } => None,
            Self::Init { step, .. } | Self::Shutdown { step, .. } => Some(*step),
        }
    }
}

/// Single backend daemon instance.
pub struct Daemon<B> {
    backend: B,
    reporter: Arc<dyn HealthReporter>,
    log: LogHandle,
    status: DaemonStatus,
    storage: Option<PathBuf>,
    config: Option<DaemonConfig>,
    started: Vec<BackendStep>,
    publisher: EventPublisher,
    subscription: Option<EventSubscription>,
}

impl<B> Daemon<B> {
    /// Builds a daemon in the `Created` state.
    ///
    /// The log handle is the proof that diagnostics are configured before the
    /// daemon emits anything.
    #[must_use]
    pub fn new(backend: B, reporter: Arc<dyn HealthReporter>, log: LogHandle) -> Self {
        let (publisher, subscription) = events::channel();
        Self {
            backend,
            reporter,
            log,
            status: DaemonStatus::new(LifecycleState::Created),
            storage: None,
            config: None,
            started: Vec::new(),
            publisher,
            subscription: Some(subscription),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.status.state()
    }

    /// Shareable status watch.
    #[must_use]
    pub fn status(&self) -> DaemonStatus {
        self.status.clone()
    }

    /// Storage root assigned through [`set_storage_path`](Self::set_storage_path).
    #[must_use]
    pub fn storage_path(&self) -> Option<&Path> {
        self.storage.as_deref()
    }

    /// Configuration the daemon was initialised with.
    #[must_use]
    pub fn config(&self) -> Option<&DaemonConfig> {
        self.config.as_ref()
    }

    /// Publisher for the daemon event bus.
    #[must_use]
    pub fn events(&self) -> EventPublisher {
        self.publisher.clone()
    }

    /// Hands out the event subscription; `None` after the first call.
    pub fn take_subscription(&mut self) -> Option<EventSubscription> {
        self.subscription.take()
    }

    /// Log subsystem handle the daemon was built with.
    #[must_use]
    pub fn log(&self) -> &LogHandle {
        &self.log
    }

    /// Backend owned by the daemon.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Assigns the storage root. Only valid once, before initialisation.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::InvalidLifecycleTransition`] outside `Created`.
    pub fn set_storage_path(&mut self, path: impl Into<PathBuf>) -> Result<(), DaemonError> {
        self.expect_state(&[LifecycleState::Created], "set the storage path")?;
        let path = path.into();
        self.reporter.storage_assigned(&path);
        self.storage = Some(path);
        self.transition(LifecycleState::StoragePathSet);
        Ok(())
    }

    /// Marks the daemon as serving shell requests.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::InvalidLifecycleTransition`] outside `Initialized`.
    pub fn serve(&mut self) -> Result<(), DaemonError> {
        self.expect_state(&[LifecycleState::Initialized], "serve")?;
        self.transition(LifecycleState::Running);
        Ok(())
    }

    fn expect_state(
        &self,
        allowed: &[LifecycleState],
        operation: &'static str,
    ) -> Result<(), DaemonError> {
        let from = self.state();
        if allowed.contains(&from) {
            return Ok(());
        }
        let error = DaemonError::InvalidLifecycleTransition { from, operation };
        self.reporter.lifecycle_failed(&error);
        Err(error)
    }

    fn transition(&self, to: LifecycleState) {
        let from = self.state();
        self.status.store(to);
        self.reporter.state_changed(from, to);
        if self.publisher.publish(DaemonEvent::StateChanged(to)).is_err() {
            tracing::trace!(target: DAEMON_TARGET, state = %to, "no event subscriber");
        }
    }
}

impl<B> Daemon<B>
where
    B: Backend,
{
    /// Runs the backend sub-steps. Only valid once, after the storage path is set.
    ///
    /// The context is checked before every step and passed into it.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::InvalidLifecycleTransition`] outside
    /// `StoragePathSet`, or [`DaemonError::Init`] naming the failing step.
    pub fn initialize(
        &mut self,
        ctx: &StartupContext,
        config: &DaemonConfig,
    ) -> Result<(), DaemonError> {
        self.expect_state(&[LifecycleState::StoragePathSet], "initialise")?;
        let Some(storage) = self.storage.clone() else {
            return Err(DaemonError::InvalidLifecycleTransition {
                from: self.state(),
                operation: "initialise",
            });
        };

        self.reporter.initialisation_starting();
        self.publisher.set_notifications(config.notifications);

        for step in BackendStep::ALL {
            if step == BackendStep::Network && config.no_p2p {
                tracing::info!(target: DAEMON_TARGET, step = %step, "peer-to-peer disabled, skipping");
                continue;
            }

            self.reporter.step_starting(step);
            let outcome = ctx
                .check()
                .map_err(|error| {
                    BackendStartupError::with_source(step, "startup interrupted", error)
                })
                .and_then(|()| self.run_step(step, ctx, &storage, config));

            if let Err(source) = outcome {
                self.reporter.step_failed(&source);
                self.rollback(ctx);
                self.transition(LifecycleState::Failed);
                let error = DaemonError::Init { step, source };
                self.reporter.lifecycle_failed(&error);
                return Err(error);
            }
            self.started.push(step);
            self.reporter.step_ready(step);
        }

        self.config = Some(config.clone());
        self.transition(LifecycleState::Initialized);
        if !config.hide_banner {
            tracing::info!(
                target: DAEMON_TARGET,
                control = %config.rpc.control,
                web = %config.rpc.web,
                "kestrel daemon ready"
            );
        }
        Ok(())
    }

    /// Stops every started step, newest first, and enters `Stopped`.
    ///
    /// Every step is asked to stop even when an earlier one fails; the first
    /// failure is returned. Cancellation of `ctx` does not abort shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::InvalidLifecycleTransition`] from `Stopped` or
    /// `Failed`, or [`DaemonError::Shutdown`] for the first failing step.
    pub fn shutdown(&mut self, ctx: &StartupContext) -> Result<(), DaemonError> {
        self.expect_state(
            &[
                LifecycleState::Created,
                LifecycleState::StoragePathSet,
                LifecycleState::Initialized,
                LifecycleState::Running,
            ],
            "shut down",
        )?;

        let mut first_failure = None;
        for step in std::mem::take(&mut self.started).into_iter().rev() {
            if let Err(source) = self.backend.stop(ctx, step) {
                self.reporter.step_stop_failed(&source);
                if first_failure.is_none() {
                    first_failure = Some(DaemonError::Shutdown { step, source });
                }
            }
        }
        self.transition(LifecycleState::Stopped);

        match first_failure {
            Some(error) => {
                self.reporter.lifecycle_failed(&error);
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn run_step(
        &mut self,
        step: BackendStep,
        ctx: &StartupContext,
        storage: &Path,
        config: &DaemonConfig,
    ) -> Result<(), BackendStartupError> {
        match step {
            BackendStep::Database => self.backend.open_database(ctx, storage, config),
            BackendStep::Network => self.backend.start_network(ctx, config, &self.publisher),
            BackendStep::Rpc => self.backend.bind_rpc(ctx, config),
        }
    }

    fn rollback(&mut self, ctx: &StartupContext) {
        for step in std::mem::take(&mut self.started).into_iter().rev() {
            if let Err(error) = self.backend.stop(ctx, step) {
                self.reporter.step_stop_failed(&error);
            }
        }
    }
}
