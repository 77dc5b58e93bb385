//! Resolution of the persistent storage root.
//!
//! The locator asks a [`DirectoryQuery`] for the ordered candidate directories
//! of a vendor/application pair, creates the first one if needed and proves it
//! is writable before handing it to the daemon.

use std::fs::DirBuilder;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Source of candidate storage directories.
pub trait DirectoryQuery: Send + Sync {
    /// Returns candidate directories for the pair; the first is canonical.
    fn candidates(&self, vendor: &str, app: &str) -> Vec<PathBuf>;
}

/// Query backed by the platform's user configuration and data directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlatformDirectoryQuery;

impl DirectoryQuery for PlatformDirectoryQuery {
    fn candidates(&self, vendor: &str, app: &str) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        for base in [dirs::config_dir(), dirs::data_dir()].into_iter().flatten() {
            let candidate = base.join(vendor).join(app);
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        candidates
    }
}

/// Errors raised while resolving the storage root.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The platform reported no candidate directory.
    #[error("no storage directory found for {vendor}/{app}")]
    NoStorageFound {
        /// Vendor queried.
        vendor: String,
        /// Application queried.
        app: String,
    },
    /// The canonical directory could not be created.
    #[error("failed to create storage directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The canonical directory exists but rejects writes.
    #[error("storage directory '{path}' is not writable: {source}")]
    NotWritable {
        /// Directory that rejected the write check.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Resolves and prepares the storage root.
pub struct StorageLocator<Q = PlatformDirectoryQuery> {
    query: Q,
}

impl StorageLocator<PlatformDirectoryQuery> {
    /// Builds a locator over the platform directories.
    #[must_use]
    pub fn platform() -> Self {
        Self::new(PlatformDirectoryQuery)
    }
}

impl<Q> StorageLocator<Q>
where
    Q: DirectoryQuery,
{
    /// Builds a locator over the supplied query.
    #[must_use]
    pub const fn new(query: Q) -> Self {
        Self { query }
    }

    /// Returns an existing, writable storage directory for the pair.
    ///
    /// # Errors
    ///
    /// Fails with [`StorageError::NoStorageFound`] when the query yields no
    /// candidates, or when the canonical candidate cannot be created or
    /// written.
    pub fn resolve(&self, vendor: &str, app: &str) -> Result<PathBuf, StorageError> {
        let Some(path) = self.query.candidates(vendor, app).into_iter().next() else {
            return Err(StorageError::NoStorageFound {
                vendor: vendor.to_owned(),
                app: app.to_owned(),
            });
        };

        ensure_directory(&path)?;
        check_writable(&path)?;
        Ok(path)
    }
}

fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder
        .create(path)
        .map_err(|source| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source,
        })
}

fn check_writable(path: &Path) -> Result<(), StorageError> {
    tempfile::Builder::new()
        .prefix(".kestrel-write-check")
        .tempfile_in(path)
        .map(drop)
        .map_err(|source| StorageError::NotWritable {
            path: path.to_path_buf(),
            source,
        })
}
