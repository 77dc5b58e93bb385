//! GUI runtime seam.
//!
//! The shell core never talks to a windowing toolkit directly. A
//! [`ShellRuntime`] receives the window description, the message handler and
//! a ready hook, runs its event loop on the calling thread and returns when
//! the user quits. [`HeadlessRuntime`] is the in-tree implementation.

mod headless;

use std::sync::Arc;

use kestrel_config::WindowSpec;
use thiserror::Error;

use crate::bridge::{BridgeError, GuiDispatcher, ShellBridge};

pub use headless::{HeadlessRecord, HeadlessRuntime, HeadlessSession};

/// Hook invoked on the GUI thread once the runtime accepts dispatched work.
pub type ReadyHook = Box<dyn FnOnce(Arc<dyn GuiDispatcher>) + Send>;

/// Everything a runtime needs to open the shell.
pub struct ShellLaunch {
    /// Main window description.
    pub window: WindowSpec,
    /// Handler for messages sent by the window.
    pub bridge: Arc<ShellBridge>,
    /// Ready hook.
    pub on_ready: ReadyHook,
}

/// Errors raised while bringing up or running the GUI.
#[derive(Debug, Error)]
pub enum BridgeRuntimeError {
    /// The window description cannot be opened.
    #[error("invalid window: {reason}")]
    InvalidWindow {
        /// Why the window was rejected.
        reason: String,
    },
    /// No GUI is available on this host.
    #[error("GUI runtime unavailable: {message}")]
    Unavailable {
        /// Runtime-specific message.
        message: String,
    },
    /// The bridge failed while the runtime was starting.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// GUI event loop driving the shell window.
pub trait ShellRuntime {
    /// Opens the window and runs until the user quits.
    ///
    /// # Errors
    ///
    /// Returns a [`BridgeRuntimeError`] if the GUI cannot start.
    fn run(&mut self, launch: ShellLaunch) -> Result<(), BridgeRuntimeError>;
}
