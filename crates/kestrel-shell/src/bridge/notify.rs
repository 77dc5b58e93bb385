//! Forwarding of daemon notifications onto the GUI thread.
//!
//! The daemon publishes on its own threads while the GUI runtime only accepts
//! work on its dispatch loop. [`NotificationDriver::install`] spawns one
//! forwarding thread that drains the daemon event bus and marshals every
//! notification through a [`GuiDispatcher`]; the marshalled task hands the
//! payload to the [`NotificationSurface`] on the GUI thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use kestreld::{DaemonEvent, EventSubscription, Notification};

use super::BRIDGE_TARGET;
use super::errors::BridgeError;

/// Work item executed on the GUI thread.
pub type GuiTask = Box<dyn FnOnce() + Send>;

/// Handle for scheduling work on the GUI dispatch loop.
pub trait GuiDispatcher: Send + Sync {
    /// Queues `task` for the GUI thread.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DispatcherClosed`] once the loop has exited.
    fn dispatch(&self, task: GuiTask) -> Result<(), BridgeError>;

    /// Asks the GUI loop to exit.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DispatcherClosed`] once the loop has exited.
    fn request_quit(&self) -> Result<(), BridgeError>;
}

/// Presents notifications to the user.
pub trait NotificationSurface: Send + Sync {
    /// Shows one notification. Called on the GUI thread.
    fn show(&self, notification: &Notification);
}

/// Surface that records notifications in the diagnostic log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotificationSurface;

impl NotificationSurface for LoggingNotificationSurface {
    fn show(&self, notification: &Notification) {
        tracing::info!(
            target: BRIDGE_TARGET,
            title = %notification.title,
            body = %notification.body,
            deep_link = ?notification.deep_link,
            "notification"
        );
    }
}

/// Installs the daemon-to-GUI notification path, at most once.
pub struct NotificationDriver {
    surface: Arc<dyn NotificationSurface>,
    installed: AtomicBool,
}

impl NotificationDriver {
    /// Builds a driver presenting notifications on `surface`.
    #[must_use]
    pub fn new(surface: Arc<dyn NotificationSurface>) -> Self {
        Self {
            surface,
            installed: AtomicBool::new(false),
        }
    }

    /// Returns `true` once [`install`](Self::install) has succeeded.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Starts forwarding notifications from `subscription` to `dispatcher`.
    ///
    /// The forwarder ends when every publisher is gone or the dispatcher
    /// closes.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DriverAlreadyInstalled`] on a second call, or
    /// [`BridgeError::Spawn`] if the forwarding thread cannot start.
    pub fn install(
        &self,
        subscription: EventSubscription,
        dispatcher: Arc<dyn GuiDispatcher>,
    ) -> Result<ForwarderHandle, BridgeError> {
        if self.installed.swap(true, Ordering::AcqRel) {
            return Err(BridgeError::DriverAlreadyInstalled);
        }

        let surface = Arc::clone(&self.surface);
        let spawned = thread::Builder::new()
            .name("kestrel-notify".to_owned())
            .spawn(move || forward(&subscription, dispatcher.as_ref(), &surface));
        match spawned {
            Ok(thread) => {
                tracing::debug!(target: BRIDGE_TARGET, "notification driver installed");
                Ok(ForwarderHandle { thread })
            }
            Err(source) => {
                self.installed.store(false, Ordering::Release);
                Err(BridgeError::Spawn { source })
            }
        }
    }
}

fn forward(
    subscription: &EventSubscription,
    dispatcher: &dyn GuiDispatcher,
    surface: &Arc<dyn NotificationSurface>,
) -> usize {
    let mut forwarded = 0;
    while let Some(event) = subscription.recv() {
        match event {
            DaemonEvent::Notification(notification) => {
                let surface = Arc::clone(surface);
                let task: GuiTask = Box::new(move || surface.show(&notification));
                if dispatcher.dispatch(task).is_err() {
                    tracing::debug!(target: BRIDGE_TARGET, "GUI loop closed, stopping forwarder");
                    break;
                }
                forwarded += 1;
            }
            DaemonEvent::StateChanged(state) => {
                tracing::trace!(target: BRIDGE_TARGET, state = %state, "daemon state changed");
            }
        }
    }
    forwarded
}

/// Join handle for the forwarding thread.
#[derive(Debug)]
pub struct ForwarderHandle {
    thread: JoinHandle<usize>,
}

impl ForwarderHandle {
    /// Waits for the forwarder and returns how many notifications it marshalled.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ForwarderPanicked`] if the thread panicked.
    pub fn join(self) -> Result<usize, BridgeError> {
        self.thread
            .join()
            .map_err(|_| BridgeError::ForwarderPanicked)
    }
}
