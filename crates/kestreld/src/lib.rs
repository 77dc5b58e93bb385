//! Backend daemon core for the Kestrel desktop client.
//!
//! The crate resolves the persistent storage root, configures the process-wide
//! diagnostic log and owns the daemon lifecycle. The desktop shell drives it in
//! a fixed order: [`StorageLocator::resolve`], [`telemetry::initialise`],
//! [`Daemon::set_storage_path`], [`Daemon::initialize`], [`Daemon::serve`] and
//! finally [`Daemon::shutdown`].
//!
//! Lifecycle events are reported through a [`HealthReporter`], and
//! notifications raised by the backend travel to the shell over the channel
//! exposed by [`Daemon::take_subscription`].

mod daemon;
pub mod events;
mod health;
pub mod secrets;
mod storage;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use daemon::{
    Backend, BackendStartupError, BackendStep, BackendStepParseError, ContextError, Daemon,
    DaemonError, DaemonStatus, LifecycleState, LocalBackend, StartupContext,
};
pub use events::{DaemonEvent, EventPublisher, EventSubscription, Notification};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use storage::{DirectoryQuery, PlatformDirectoryQuery, StorageError, StorageLocator};
pub use telemetry::{LogHandle, LogRing, TelemetryError};

#[cfg(test)]
mod tests;
