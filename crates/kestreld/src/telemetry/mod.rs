//! Diagnostic log subsystem.
//!
//! [`initialise`] builds the subscriber described by [`LogOptions`] and
//! installs it as the process-wide default. Every event passing the shared
//! [`NamespaceFilter`] lands in two sinks: the bounded [`LogRing`] kept in
//! memory for the shell, and an append-only log file in the configured
//! directory. The returned [`LogHandle`] is threaded explicitly into the
//! components constructed afterwards, which makes "logging is initialised"
//! a precondition the type system checks.

mod filter;
mod ring;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use kestrel_config::{LogFormat, LogOptions};
use once_cell::sync::OnceCell;
use tracing::Dispatch;
use tracing::dispatcher::SetGlobalDefaultError;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry, fmt};

pub use filter::NamespaceFilter;
pub use ring::LogRing;

use ring::RingLayer;

static TELEMETRY: OnceCell<LogHandle> = OnceCell::new();

/// Handle to the initialised log subsystem.
#[derive(Debug, Clone)]
pub struct LogHandle {
    ring: LogRing,
    file: Option<PathBuf>,
}

impl LogHandle {
    /// Builds a handle whose ring is not attached to any subscriber.
    ///
    /// Used where the caller manages the subscriber itself, for example test
    /// harnesses that scope a dispatcher with `tracing::dispatcher::with_default`.
    #[must_use]
    pub fn detached(capacity: usize) -> Self {
        Self {
            ring: LogRing::new(capacity),
            file: None,
        }
    }

    /// In-memory ring receiving every retained event.
    #[must_use]
    pub fn ring(&self) -> &LogRing {
        &self.ring
    }

    /// Log file written by the subsystem, when one is attached.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// Errors encountered while configuring the log subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A namespace glob failed to compile.
    #[error("invalid log namespace pattern '{pattern}': {message}")]
    Filter {
        /// Offending pattern.
        pattern: String,
        /// Parser message.
        message: String,
    },
    /// The log directory could not be created.
    #[error("failed to create log directory '{path}': {source}")]
    Directory {
        /// Directory path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The log file could not be opened for appending.
    #[error("failed to open log file '{path}': {source}")]
    File {
        /// Log file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Another subscriber already owns the global default.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the log subsystem and installs it as the process default.
///
/// The first successful call installs the subscriber; later calls return a
/// clone of the original handle without touching global state again.
///
/// # Errors
///
/// Returns a [`TelemetryError`] when the filter does not compile, the target
/// directory is not writable, or a foreign subscriber is already installed.
pub fn initialise(options: &LogOptions) -> Result<LogHandle, TelemetryError> {
    TELEMETRY
        .get_or_try_init(|| {
            let (handle, dispatch) = build(options)?;
            tracing::dispatcher::set_global_default(dispatch)
                .map_err(TelemetryError::Subscriber)?;
            Ok(handle)
        })
        .cloned()
}

/// Builds the subscriber without installing it.
///
/// # Errors
///
/// Returns a [`TelemetryError`] when the filter does not compile or the log
/// file cannot be opened.
pub fn build(options: &LogOptions) -> Result<(LogHandle, Dispatch), TelemetryError> {
    let filter = NamespaceFilter::from_options(options)?;
    let path = open_target(options)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| TelemetryError::File {
            path: path.clone(),
            source,
        })?;

    let writer = Mutex::new(file);
    let file_layer: Box<dyn Layer<Registry> + Send + Sync> = match options.format {
        LogFormat::Json => Box::new(
            fmt::layer::<Registry>()
                .json()
                .flatten_event(true)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339())
                .with_filter(filter.clone()),
        ),
        LogFormat::Compact => Box::new(
            fmt::layer::<Registry>()
                .compact()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339())
                .with_filter(filter.clone()),
        ),
    };

    let ring = LogRing::new(options.ring_capacity);
    let subscriber = Registry::default()
        .with(file_layer)
        .with(RingLayer::new(ring.clone()).with_filter(filter));

    let handle = LogHandle {
        ring,
        file: Some(path),
    };
    Ok((handle, Dispatch::new(subscriber)))
}

fn open_target(options: &LogOptions) -> Result<PathBuf, TelemetryError> {
    let directory = options.directory();
    fs::create_dir_all(directory).map_err(|source| TelemetryError::Directory {
        path: directory.to_path_buf(),
        source,
    })?;
    Ok(options.file_path())
}
