//! Bridge between the daemon and the graphical shell.

mod errors;
mod handler;
mod message;
mod notify;

pub use errors::BridgeError;
pub use handler::{DAEMON_STATUS_ROUTE, LOGS_TAIL_ROUTE, MessageRouter, ShellBridge};
pub use message::{ShellMessage, ShellResponse};
pub use notify::{
    ForwarderHandle, GuiDispatcher, GuiTask, LoggingNotificationSurface, NotificationDriver,
    NotificationSurface,
};

pub(crate) const BRIDGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bridge");
