use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_DATABASE_NAME, DEFAULT_KEY_ACCOUNT, DEFAULT_KEY_SERVICE, control_rpc_endpoint,
    web_rpc_endpoint,
};
use crate::network::NetworkConfig;

/// Entry in the platform secret store holding a symmetric key.
///
/// The configuration never carries key material itself; the daemon resolves
/// the reference when it opens the database.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeyReference {
    /// Secret store service name.
    pub service: String,
    /// Account within the service.
    pub account: String,
}

impl KeyReference {
    /// Builds a key reference.
    #[must_use]
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }
}

impl Default for KeyReference {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_SERVICE, DEFAULT_KEY_ACCOUNT)
    }
}

impl fmt::Display for KeyReference {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.service, self.account)
    }
}

/// Database encryption mode.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Encryption {
    /// The database is stored in plain form.
    Disabled,
    /// The database is encrypted with the referenced key.
    Enabled {
        /// Where the key lives.
        key: KeyReference,
    },
}

impl Default for Encryption {
    fn default() -> Self {
        Self::Enabled {
            key: KeyReference::default(),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SqlConfig {
    /// Database file name, relative to the storage root.
    pub name: String,
    /// Encryption mode.
    pub encryption: Encryption,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DATABASE_NAME.to_owned(),
            encryption: Encryption::default(),
        }
    }
}

/// RPC listener addresses.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct RpcEndpoints {
    /// Control-plane RPC.
    pub control: SocketAddr,
    /// Web-compatible RPC variant.
    pub web: SocketAddr,
}

impl Default for RpcEndpoints {
    fn default() -> Self {
        Self {
            control: control_rpc_endpoint(),
            web: web_rpc_endpoint(),
        }
    }
}

/// Configuration consumed by the backend daemon.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DaemonConfig {
    /// Database settings.
    pub sql: SqlConfig,
    /// Peer-to-peer network settings.
    pub network: NetworkConfig,
    /// RPC listener addresses.
    pub rpc: RpcEndpoints,
    /// Suppress the startup banner.
    pub hide_banner: bool,
    /// Delete the database file before opening it.
    pub drop_database: bool,
    /// Initialise then stop without serving.
    pub init_only: bool,
    /// Start the built-in bot account.
    pub with_bot: bool,
    /// Emit notification events.
    pub notifications: bool,
    /// Private key file; the daemon generates an identity when absent.
    pub private_key_file: Option<PathBuf>,
    /// Skip the network sub-step entirely.
    pub no_p2p: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            sql: SqlConfig::default(),
            network: NetworkConfig::default(),
            rpc: RpcEndpoints::default(),
            hide_banner: true,
            drop_database: false,
            init_only: false,
            with_bot: false,
            notifications: true,
            private_key_file: None,
            no_p2p: false,
        }
    }
}
