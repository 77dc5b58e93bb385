//! Lifecycle states and the cross-thread status watch.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Constructed, no storage path yet.
    Created,
    /// Storage path assigned.
    StoragePathSet,
    /// Every backend step is up.
    Initialized,
    /// The shell is serving requests.
    Running,
    /// Shut down.
    Stopped,
    /// Initialisation failed; terminal.
    Failed,
}

impl LifecycleState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::StoragePathSet => 1,
            Self::Initialized => 2,
            Self::Running => 3,
            Self::Stopped => 4,
            Self::Failed => 5,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::StoragePathSet,
            2 => Self::Initialized,
            3 => Self::Running,
            4 => Self::Stopped,
            _ => Self::Failed,
        }
    }

    /// Returns `true` when the daemon can answer shell requests.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Initialized | Self::Running)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::StoragePathSet => "storage_path_set",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        formatter.write_str(label)
    }
}

/// Read-only view of the daemon state, shareable across threads.
#[derive(Debug, Clone)]
pub struct DaemonStatus {
    state: Arc<AtomicU8>,
}

impl DaemonStatus {
    pub(crate) fn new(state: LifecycleState) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(state.as_u8())),
        }
    }

    pub(crate) fn store(&self, state: LifecycleState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns `true` when the daemon is initialised or running.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }
}
