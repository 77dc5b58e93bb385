//! Error types for the shell bridge.

use std::io;

use thiserror::Error;

/// Errors surfaced by the message handler and the notification driver.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The inbound message was not a valid envelope.
    #[error("malformed shell message: {source}")]
    MalformedMessage {
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// A response could not be serialised.
    #[error("failed to serialise shell response: {0}")]
    Serialize(#[source] serde_json::Error),
    /// The notification driver was already installed.
    #[error("notification driver is already installed")]
    DriverAlreadyInstalled,
    /// The GUI dispatch loop has exited.
    #[error("GUI dispatcher is closed")]
    DispatcherClosed,
    /// The forwarding thread could not be spawned.
    #[error("failed to spawn notification forwarder: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The forwarding thread panicked.
    #[error("notification forwarder panicked")]
    ForwarderPanicked,
}
