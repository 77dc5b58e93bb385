//! Startup validation of assembled configuration.

use std::net::SocketAddr;

use thiserror::Error;

use crate::{AppConfig, Encryption};

/// Errors reported when assembled values cannot be used at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigAssemblyError {
    /// Both RPC endpoints resolve to the same address.
    #[error("control and web RPC endpoints both bind {address}")]
    DuplicateRpcEndpoint {
        /// Shared address.
        address: SocketAddr,
    },
    /// An RPC endpoint would bind an ephemeral port.
    #[error("{endpoint} RPC endpoint {address} must use a fixed port")]
    EphemeralRpcPort {
        /// Endpoint label.
        endpoint: &'static str,
        /// Offending address.
        address: SocketAddr,
    },
    /// The log ring cannot hold any data.
    #[error("log ring capacity must be greater than zero")]
    ZeroRingCapacity,
    /// A namespace glob does not compile.
    #[error("invalid log namespace pattern '{pattern}': {message}")]
    InvalidNamespace {
        /// Offending pattern.
        pattern: String,
        /// Parser message.
        message: String,
    },
    /// The database name is blank.
    #[error("database file name is empty")]
    EmptyDatabaseName,
    /// Encryption is enabled without a usable key reference.
    #[error("database encryption is enabled but the key reference is empty")]
    EmptyKeyReference,
    /// The shell homepage is blank.
    #[error("shell homepage is empty")]
    EmptyHomepage,
}

pub(crate) fn validate(config: &AppConfig) -> Result<(), ConfigAssemblyError> {
    let rpc = config.daemon.rpc;
    for (endpoint, address) in [("control", rpc.control), ("web", rpc.web)] {
        if address.port() == 0 {
            return Err(ConfigAssemblyError::EphemeralRpcPort { endpoint, address });
        }
    }
    if rpc.control == rpc.web {
        return Err(ConfigAssemblyError::DuplicateRpcEndpoint {
            address: rpc.control,
        });
    }

    if config.log.ring_capacity == 0 {
        return Err(ConfigAssemblyError::ZeroRingCapacity);
    }
    for pattern in config.log.namespace_patterns() {
        glob::Pattern::new(pattern).map_err(|error| ConfigAssemblyError::InvalidNamespace {
            pattern: pattern.to_owned(),
            message: error.to_string(),
        })?;
    }

    let sql = &config.daemon.sql;
    if sql.name.trim().is_empty() {
        return Err(ConfigAssemblyError::EmptyDatabaseName);
    }
    if let Encryption::Enabled { key } = &sql.encryption
        && (key.service.trim().is_empty() || key.account.trim().is_empty())
    {
        return Err(ConfigAssemblyError::EmptyKeyReference);
    }

    if config.window.homepage.trim().is_empty() {
        return Err(ConfigAssemblyError::EmptyHomepage);
    }
    Ok(())
}
