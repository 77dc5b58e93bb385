//! Configuration model for the Kestrel desktop core.
//!
//! The crate owns every value the bootstrap needs before the daemon comes up:
//! the daemon configuration (database, network, RPC), the log subsystem
//! options, and the shell window description. Values are assembled once by
//! [`assemble`] from three layers:
//!
//! 1. fixed baseline defaults (see [`defaults`]),
//! 2. the captured [`Environment`] (home directory and platform), used only to
//!    place the log directory,
//! 3. the [`LaunchOverrides`] loaded from configuration files, `KESTREL_*`
//!    environment variables, and the command line.
//!
//! Assembly is total: every field has a documented default, so composing a
//! configuration cannot fail. [`AppConfig::validate`] runs the startup checks
//! separately so the bootstrap can fail explicitly before any subsystem starts.

mod daemon;
pub mod defaults;
mod environment;
mod logging;
mod network;
mod overrides;
mod validate;
mod window;

use serde::{Deserialize, Serialize};

pub use daemon::{DaemonConfig, Encryption, KeyReference, RpcEndpoints, SqlConfig};
pub use defaults::{
    DEFAULT_APP, DEFAULT_HOMEPAGE, DEFAULT_LOG_NAMESPACES, DEFAULT_RING_CAPACITY, DEFAULT_VENDOR,
};
pub use environment::{Environment, Platform};
pub use logging::{LogFormat, LogFormatParseError, LogLevel, LogLevelParseError, LogOptions};
pub use network::{NetworkConfig, Transport, TransportBind};
pub use overrides::LaunchOverrides;
pub use validate::ConfigAssemblyError;
pub use window::{Geometry, MenuRole, MenuSpec, WindowSpec};

/// Vendor and application names used to key the persistent storage root.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StorageIdentity {
    /// Organisation publishing the application.
    pub vendor: String,
    /// Application name.
    pub app: String,
}

impl Default for StorageIdentity {
    fn default() -> Self {
        Self {
            vendor: DEFAULT_VENDOR.to_owned(),
            app: DEFAULT_APP.to_owned(),
        }
    }
}

/// Fully assembled runtime configuration.
///
/// Constructed once at startup and never mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Storage identity used by the storage locator.
    pub storage: StorageIdentity,
    /// Backend daemon configuration.
    pub daemon: DaemonConfig,
    /// Diagnostic log options.
    pub log: LogOptions,
    /// Shell window description.
    pub window: WindowSpec,
}

impl AppConfig {
    /// Accessor for the daemon configuration.
    #[must_use]
    pub fn daemon(&self) -> &DaemonConfig {
        &self.daemon
    }

    /// Accessor for the log options.
    #[must_use]
    pub fn log(&self) -> &LogOptions {
        &self.log
    }

    /// Accessor for the window description.
    #[must_use]
    pub fn window(&self) -> &WindowSpec {
        &self.window
    }

    /// Runs the startup checks over the assembled values.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigAssemblyError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigAssemblyError> {
        validate::validate(self)
    }
}

/// Composes the runtime configuration from defaults, environment and overrides.
///
/// The result depends only on the two arguments: identical inputs yield
/// structurally identical configurations.
#[must_use]
pub fn assemble(overrides: &LaunchOverrides, env: &Environment) -> AppConfig {
    let homepage = Some(overrides.homepage.trim())
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_HOMEPAGE);

    AppConfig {
        storage: StorageIdentity::default(),
        daemon: DaemonConfig {
            init_only: overrides.init_only,
            ..DaemonConfig::default()
        },
        log: LogOptions::with_directory(env.log_directory()),
        window: WindowSpec::with_homepage(homepage),
    }
}
