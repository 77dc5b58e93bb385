//! Cancellation and deadline carrier for startup work.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Reasons a [`StartupContext`] refuses further work.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The context was cancelled.
    #[error("startup was cancelled")]
    Cancelled,
    /// The deadline elapsed.
    #[error("startup deadline exceeded")]
    DeadlineExceeded,
}

/// Shared cancellation flag with an optional deadline.
///
/// Clones observe the same flag, so a signal handler thread can cancel work
/// running on the startup thread.
#[derive(Debug, Clone, Default)]
pub struct StartupContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl StartupContext {
    /// Builds a context without a deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Cancels every clone of this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Deadline after which work should stop, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails when the context is cancelled or past its deadline.
    ///
    /// # Errors
    ///
    /// Returns the matching [`ContextError`].
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
