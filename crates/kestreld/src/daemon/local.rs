//! In-tree backend holding the resources each sub-step acquires.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};

use kestrel_config::{DaemonConfig, Encryption};

use crate::events::EventPublisher;
use crate::secrets::{KeyringSecretStore, SecretStore};

use super::backend::{Backend, BackendStartupError, BackendStep};
use super::context::StartupContext;

const BACKEND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::backend");

/// Backend that owns the database file, the network session and the RPC
/// listeners for the lifetime of the daemon.
#[derive(Debug)]
pub struct LocalBackend<S = KeyringSecretStore> {
    secrets: S,
    database: Option<DatabaseHandle>,
    network: Option<NetworkSession>,
    listeners: Vec<TcpListener>,
}

#[derive(Debug)]
struct DatabaseHandle {
    path: PathBuf,
    encrypted: bool,
    _file: File,
}

#[derive(Debug)]
struct NetworkSession {
    events: EventPublisher,
    binds: usize,
}

impl LocalBackend<KeyringSecretStore> {
    /// Builds a backend resolving keys through the platform keyring.
    #[must_use]
    pub fn keyring() -> Self {
        Self::new(KeyringSecretStore)
    }
}

impl<S> LocalBackend<S>
where
    S: SecretStore,
{
    /// Builds a backend over the supplied secret store.
    #[must_use]
    pub fn new(secrets: S) -> Self {
        Self {
            secrets,
            database: None,
            network: None,
            listeners: Vec::new(),
        }
    }

    /// Path of the open database file, if the database step ran.
    #[must_use]
    pub fn database_path(&self) -> Option<&Path> {
        self.database.as_ref().map(|handle| handle.path.as_path())
    }

    /// Returns `true` when the database was opened with a resolved key.
    #[must_use]
    pub fn database_encrypted(&self) -> bool {
        self.database.as_ref().is_some_and(|handle| handle.encrypted)
    }

    /// Returns `true` while the network session is active.
    #[must_use]
    pub fn network_running(&self) -> bool {
        self.network.is_some()
    }

    /// Publisher captured by the network session, for raising notifications.
    #[must_use]
    pub fn network_events(&self) -> Option<&EventPublisher> {
        self.network.as_ref().map(|session| &session.events)
    }

    /// Addresses the RPC listeners are bound to.
    #[must_use]
    pub fn rpc_addresses(&self) -> Vec<SocketAddr> {
        self.listeners
            .iter()
            .filter_map(|listener| listener.local_addr().ok())
            .collect()
    }
}

fn interrupted(step: BackendStep, ctx: &StartupContext) -> Result<(), BackendStartupError> {
    ctx.check()
        .map_err(|error| BackendStartupError::with_source(step, "startup interrupted", error))
}

fn drop_database_file(path: &Path) -> Result<(), BackendStartupError> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(target: BACKEND_TARGET, path = %path.display(), "dropped database");
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(BackendStartupError::with_source(
            BackendStep::Database,
            format!("failed to drop database '{}'", path.display()),
            error,
        )),
    }
}

fn validate_multiaddr(kind: &str, address: &str) -> Result<(), BackendStartupError> {
    if address.starts_with('/') && address.len() > 1 {
        Ok(())
    } else {
        Err(BackendStartupError::new(
            BackendStep::Network,
            format!("invalid {kind} address '{address}'"),
        ))
    }
}

impl<S> Backend for LocalBackend<S>
where
    S: SecretStore,
{
    fn open_database(
        &mut self,
        ctx: &StartupContext,
        storage: &Path,
        config: &DaemonConfig,
    ) -> Result<(), BackendStartupError> {
        interrupted(BackendStep::Database, ctx)?;
        let path = storage.join(&config.sql.name);
        if config.drop_database {
            drop_database_file(&path)?;
        }

        let encrypted = match &config.sql.encryption {
            Encryption::Disabled => false,
            Encryption::Enabled { key } => {
                let secret = self.secrets.resolve(key).map_err(|error| {
                    BackendStartupError::with_source(
                        BackendStep::Database,
                        "failed to resolve database key",
                        error,
                    )
                })?;
                if secret.is_empty() {
                    return Err(BackendStartupError::new(
                        BackendStep::Database,
                        format!("database key {key} is empty"),
                    ));
                }
                true
            }
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|error| {
                BackendStartupError::with_source(
                    BackendStep::Database,
                    format!("failed to open database '{}'", path.display()),
                    error,
                )
            })?;
        tracing::debug!(
            target: BACKEND_TARGET,
            path = %path.display(),
            encrypted,
            "database opened"
        );
        self.database = Some(DatabaseHandle {
            path,
            encrypted,
            _file: file,
        });
        Ok(())
    }

    fn start_network(
        &mut self,
        ctx: &StartupContext,
        config: &DaemonConfig,
        events: &EventPublisher,
    ) -> Result<(), BackendStartupError> {
        interrupted(BackendStep::Network, ctx)?;
        let network = &config.network;
        for bind in &network.bind {
            validate_multiaddr(&bind.transport.to_string(), &bind.address)?;
        }
        for peer in &network.bootstrap {
            validate_multiaddr("bootstrap", peer)?;
        }
        if let Some(key_file) = &config.private_key_file
            && !key_file.is_file()
        {
            return Err(BackendStartupError::new(
                BackendStep::Network,
                format!("private key file '{}' does not exist", key_file.display()),
            ));
        }

        tracing::debug!(
            target: BACKEND_TARGET,
            binds = network.bind.len(),
            bootstrap = network.bootstrap.len(),
            mdns = network.mdns,
            mobile = network.mobile,
            "network session started"
        );
        self.network = Some(NetworkSession {
            events: events.clone(),
            binds: network.bind.len(),
        });
        Ok(())
    }

    fn bind_rpc(
        &mut self,
        ctx: &StartupContext,
        config: &DaemonConfig,
    ) -> Result<(), BackendStartupError> {
        interrupted(BackendStep::Rpc, ctx)?;
        let mut listeners = Vec::with_capacity(2);
        for address in [config.rpc.control, config.rpc.web] {
            let listener = TcpListener::bind(address).map_err(|error| {
                BackendStartupError::with_source(
                    BackendStep::Rpc,
                    format!("failed to bind RPC endpoint {address}"),
                    error,
                )
            })?;
            listeners.push(listener);
        }
        self.listeners = listeners;
        tracing::debug!(
            target: BACKEND_TARGET,
            control = %config.rpc.control,
            web = %config.rpc.web,
            "rpc endpoints bound"
        );
        Ok(())
    }

    fn stop(&mut self, _ctx: &StartupContext, step: BackendStep) -> Result<(), BackendStartupError> {
        match step {
            BackendStep::Database => {
                self.database = None;
            }
            BackendStep::Network => {
                if let Some(session) = self.network.take() {
                    tracing::debug!(
                        target: BACKEND_TARGET,
                        binds = session.binds,
                        "network session stopped"
                    );
                }
            }
            BackendStep::Rpc => self.listeners.clear(),
        }
        Ok(())
    }
}
