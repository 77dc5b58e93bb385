//! Daemon event bus.
//!
//! The daemon and its backend publish [`DaemonEvent`]s through cloneable
//! [`EventPublisher`]s; a single [`EventSubscription`] drains them on the
//! consumer side. The channel is unbounded so publishers on daemon threads
//! never block on a slow shell.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::daemon::LifecycleState;

/// User-facing notification raised by the daemon.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Notification {
    /// Short heading.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Optional icon resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Optional in-app link opened when the notification is activated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_link: Option<String>,
}

impl Notification {
    /// Builds a notification with a title and body.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: None,
            deep_link: None,
        }
    }

    /// Attaches an in-app link.
    #[must_use]
    pub fn with_deep_link(mut self, link: impl Into<String>) -> Self {
        self.deep_link = Some(link.into());
        self
    }
}

/// Events published by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    /// A notification for the user.
    Notification(Notification),
    /// The lifecycle state changed.
    StateChanged(LifecycleState),
}

/// Raised when every subscriber has gone away.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("daemon event bus is closed")]
pub struct EventBusClosed;

/// Creates a connected publisher and subscription.
#[must_use]
pub fn channel() -> (EventPublisher, EventSubscription) {
    let (sender, receiver) = mpsc::channel();
    let publisher = EventPublisher {
        sender,
        notifications: Arc::new(AtomicBool::new(true)),
    };
    (publisher, EventSubscription { receiver })
}

/// Cloneable sending half of the bus.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: Sender<DaemonEvent>,
    notifications: Arc<AtomicBool>,
}

impl EventPublisher {
    /// Publishes an event.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusClosed`] when the subscription has been dropped.
    pub fn publish(&self, event: DaemonEvent) -> Result<(), EventBusClosed> {
        self.sender.send(event).map_err(|_| EventBusClosed)
    }

    /// Publishes a notification unless notifications are disabled.
    ///
    /// Returns `Ok(false)` when the notification was suppressed.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusClosed`] when the subscription has been dropped.
    pub fn notify(&self, notification: Notification) -> Result<bool, EventBusClosed> {
        if !self.notifications_enabled() {
            return Ok(false);
        }
        self.publish(DaemonEvent::Notification(notification))
            .map(|()| true)
    }

    /// Enables or disables notifications for every clone of this publisher.
    pub fn set_notifications(&self, enabled: bool) {
        self.notifications.store(enabled, Ordering::Release);
    }

    /// Returns `true` when notifications are forwarded.
    #[must_use]
    pub fn notifications_enabled(&self) -> bool {
        self.notifications.load(Ordering::Acquire)
    }
}

/// Receiving half of the bus.
#[derive(Debug)]
pub struct EventSubscription {
    receiver: Receiver<DaemonEvent>,
}

impl EventSubscription {
    /// Blocks until the next event; `None` once every publisher is gone.
    #[must_use]
    pub fn recv(&self) -> Option<DaemonEvent> {
        self.receiver.recv().ok()
    }

    /// Waits up to `timeout` for the next event.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusClosed`] once every publisher is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<DaemonEvent>, EventBusClosed> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EventBusClosed),
        }
    }

    /// Returns a pending event without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusClosed`] once every publisher is gone.
    pub fn try_recv(&self) -> Result<Option<DaemonEvent>, EventBusClosed> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(EventBusClosed),
        }
    }
}
