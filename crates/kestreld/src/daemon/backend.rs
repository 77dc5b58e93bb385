//! Backend seam driven by the lifecycle.
//!
//! The daemon's database engine, P2P stack and RPC servers live behind the
//! [`Backend`] trait. The lifecycle only sequences the three sub-steps and
//! rolls back the ones that already started when a later step fails.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use kestrel_config::DaemonConfig;
use thiserror::Error;

use crate::events::EventPublisher;

use super::context::StartupContext;

/// Sub-steps of daemon initialisation, in start order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendStep {
    /// Open and migrate the database.
    Database,
    /// Start the peer-to-peer network.
    Network,
    /// Bind the RPC endpoints.
    Rpc,
}

impl BackendStep {
    /// Every step in start order.
    pub const ALL: [Self; 3] = [Self::Database, Self::Network, Self::Rpc];
}

impl fmt::Display for BackendStep {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Database => "database",
            Self::Network => "network",
            Self::Rpc => "rpc",
        };
        formatter.write_str(label)
    }
}

/// Error returned when parsing a backend step fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported daemon step: {0}")]
pub struct BackendStepParseError(String);

impl FromStr for BackendStep {
    type Err = BackendStepParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "database" => Ok(Self::Database),
            "network" => Ok(Self::Network),
            "rpc" => Ok(Self::Rpc),
            other => Err(BackendStepParseError(other.to_owned())),
        }
    }
}

/// Errors surfaced when a sub-step fails to start or stop.
#[derive(Debug, Error)]
#[error("daemon step {step} failed: {message}")]
pub struct BackendStartupError {
    /// Step that failed.
    pub step: BackendStep,
    message: String,
    /// Optional source error reported by the backend implementation.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendStartupError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(step: BackendStep, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        step: BackendStep,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            step,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Services the lifecycle starts and stops.
///
/// Every method receives the startup context and should return early once
/// [`StartupContext::check`] fails.
#[cfg_attr(test, mockall::automock)]
pub trait Backend: Send {
    /// Opens or creates the database under `storage`.
    fn open_database(
        &mut self,
        ctx: &StartupContext,
        storage: &Path,
        config: &DaemonConfig,
    ) -> Result<(), BackendStartupError>;

    /// Starts the peer-to-peer network.
    fn start_network(
        &mut self,
        ctx: &StartupContext,
        config: &DaemonConfig,
        events: &EventPublisher,
    ) -> Result<(), BackendStartupError>;

    /// Binds the RPC endpoints.
    fn bind_rpc(
        &mut self,
        ctx: &StartupContext,
        config: &DaemonConfig,
    ) -> Result<(), BackendStartupError>;

    /// Releases whatever `step` acquired.
    fn stop(&mut self, ctx: &StartupContext, step: BackendStep) -> Result<(), BackendStartupError>;
}
