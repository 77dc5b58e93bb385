//! Desktop shell for the Kestrel client.
//!
//! The shell owns process start-up. [`run_desktop`] resolves the storage
//! root, assembles configuration, installs diagnostics, brings the daemon up
//! and then hands control to a [`runtime::ShellRuntime`] that hosts the main
//! window. The [`bridge`] module carries messages from the window to the
//! daemon and daemon notifications back onto the GUI thread.

mod bootstrap;
pub mod bridge;
pub mod process;
pub mod runtime;

pub use bootstrap::{
    BootstrapError, BootstrapPlan, GlobalLogInstaller, LogInstaller, run_desktop,
    run_desktop_with,
};
