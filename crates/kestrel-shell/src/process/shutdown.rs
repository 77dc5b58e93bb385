//! Termination signal handling.
//!
//! The desktop process waits on these signals in two places: the quit
//! watcher that closes the GUI loop, and the bootstrap fallback that keeps
//! the daemon serving after the shell failed to start.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;

use super::PROCESS_TARGET;

/// Signals that end the desktop process.
pub const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Source of the "time to shut down" event.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until the process should shut down.
    ///
    /// # Errors
    ///
    /// Returns a [`ShutdownError`] if the listener cannot be installed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Registering the signal handlers failed.
    #[error("failed to register termination signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Listener for [`TERMINATION_SIGNALS`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Builds a listener; handlers are registered on the first `wait`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals =
            Signals::new(TERMINATION_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            tracing::info!(
                target: PROCESS_TARGET,
                signal = signal_name(signal),
                "termination signal received"
            );
        }
        Ok(())
    }
}

/// Conventional name of a termination signal.
#[must_use]
pub const fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGTERM => "SIGTERM",
        SIGINT => "SIGINT",
        SIGQUIT => "SIGQUIT",
        SIGHUP => "SIGHUP",
        _ => "unknown",
    }
}
