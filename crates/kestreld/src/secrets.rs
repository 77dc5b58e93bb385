//! Secret store seam for database key material.
//!
//! Configuration only carries a [`KeyReference`]; the daemon resolves it here
//! when the database sub-step runs. The production store delegates to the
//! platform keyring and generates a random key the first time a reference is
//! used.

use std::fmt;

use kestrel_config::KeyReference;
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;
use zeroize::Zeroizing;

const KEY_BYTES: usize = 32;

/// Symmetric key material, wiped from memory on drop.
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
    /// Wraps key material.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Generates a fresh random key encoded as hex.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0_u8; KEY_BYTES]);
        OsRng.fill_bytes(&mut *bytes);
        Self::new(hex::encode(&*bytes))
    }

    /// Exposes the key material.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Returns `true` when the key holds no material.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SecretKey(<redacted>)")
    }
}

/// Errors raised while resolving key material.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The store has no entry and cannot create one.
    #[error("no secret stored for {reference}")]
    Missing {
        /// Reference that was looked up.
        reference: KeyReference,
    },
    /// The platform store failed.
    #[error("secret store unavailable for {reference}: {message}")]
    Unavailable {
        /// Reference that was looked up.
        reference: KeyReference,
        /// Store-specific message.
        message: String,
    },
}

/// Source of key material for key references.
pub trait SecretStore: Send + Sync {
    /// Resolves the key behind `reference`.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] when the store cannot produce the key.
    fn resolve(&self, reference: &KeyReference) -> Result<SecretKey, SecretError>;
}

/// Store backed by the platform keyring.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringSecretStore;

impl SecretStore for KeyringSecretStore {
    fn resolve(&self, reference: &KeyReference) -> Result<SecretKey, SecretError> {
        let unavailable = |error: keyring::Error| SecretError::Unavailable {
            reference: reference.clone(),
            message: error.to_string(),
        };

        let entry =
            keyring::Entry::new(&reference.service, &reference.account).map_err(unavailable)?;
        match entry.get_password() {
            Ok(secret) => Ok(SecretKey::new(secret)),
            Err(keyring::Error::NoEntry) => {
                let key = SecretKey::generate();
                entry.set_password(key.expose()).map_err(unavailable)?;
                tracing::info!(
                    target: concat!(env!("CARGO_PKG_NAME"), "::secrets"),
                    reference = %reference,
                    "generated database key"
                );
                Ok(key)
            }
            Err(error) => Err(unavailable(error)),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemorySecretStore;

#[cfg(any(test, feature = "test-support"))]
mod memory {
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};

    use kestrel_config::KeyReference;

    use super::{SecretError, SecretKey, SecretStore};

    /// In-memory store for tests.
    #[derive(Debug, Default)]
    pub struct MemorySecretStore {
        secrets: Mutex<HashMap<(String, String), String>>,
    }

    impl MemorySecretStore {
        /// Builds a store holding one secret.
        #[must_use]
        pub fn with_secret(reference: &KeyReference, value: impl Into<String>) -> Self {
            let store = Self::default();
            store.insert(reference, value);
            store
        }

        /// Stores a secret.
        pub fn insert(&self, reference: &KeyReference, value: impl Into<String>) {
            self.secrets
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(
                    (reference.service.clone(), reference.account.clone()),
                    value.into(),
                );
        }
    }

    impl SecretStore for MemorySecretStore {
        fn resolve(&self, reference: &KeyReference) -> Result<SecretKey, SecretError> {
            self.secrets
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&(reference.service.clone(), reference.account.clone()))
                .map(SecretKey::new)
                .ok_or_else(|| SecretError::Missing {
                    reference: reference.clone(),
                })
        }
    }
}
