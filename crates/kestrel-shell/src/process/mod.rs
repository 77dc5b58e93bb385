//! Process-level collaborators.

mod shutdown;

pub use shutdown::{
    ShutdownError, ShutdownSignal, SystemShutdownSignal, TERMINATION_SIGNALS, signal_name,
};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
