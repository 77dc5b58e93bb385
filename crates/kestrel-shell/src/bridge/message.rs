//! JSON envelopes exchanged with the shell.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::BridgeError;

/// Message sent by the shell to the core.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ShellMessage {
    /// Route name, for example `daemon.status`.
    pub name: String,
    /// Route-specific payload.
    #[serde(default)]
    pub payload: Value,
}

impl ShellMessage {
    /// Builds a message with a payload.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Builds a message without a payload.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }

    /// Parses a JSON envelope.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedMessage`] when the text is not a valid
    /// envelope.
    pub fn parse(raw: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(raw).map_err(|source| BridgeError::MalformedMessage { source })
    }
}

/// Reply returned for every shell message.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "status", content = "payload", rename_all = "snake_case")]
pub enum ShellResponse {
    /// The route answered.
    Ok(Value),
    /// The daemon has not finished initialising.
    NotReady,
    /// The route failed or does not exist.
    Error(String),
}

impl ShellResponse {
    /// Builds an error response.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Returns `true` for [`ShellResponse::Ok`].
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Serialises the response envelope.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Serialize`] if the payload cannot be encoded.
    pub fn to_json(&self) -> Result<String, BridgeError> {
        serde_json::to_string(self).map_err(BridgeError::Serialize)
    }
}
