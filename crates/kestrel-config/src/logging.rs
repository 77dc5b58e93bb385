use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::{DEFAULT_LOG_NAMESPACES, DEFAULT_RING_CAPACITY, LOG_FILE_NAME};

/// Supported logging output formats for the log file.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Minimum severity retained by the log subsystem.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Deserialize,
    Serialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogLevel {
    /// Very verbose tracing output.
    Trace,
    /// Diagnostic output.
    #[default]
    Debug,
    /// Informational output.
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures.
    Error,
}

/// Errors encountered while parsing a [`LogLevel`] from text.
pub type LogLevelParseError = strum::ParseError;

/// Options for the diagnostic log subsystem.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LogOptions {
    /// Ring buffer capacity in bytes.
    pub ring_capacity: usize,
    /// Minimum severity.
    pub level: LogLevel,
    /// Comma-separated namespace globs, for example `core.*,vendor.gorm*`.
    pub namespaces: String,
    /// Directory receiving the log file.
    pub directory: PathBuf,
    /// Log file format.
    pub format: LogFormat,
}

impl LogOptions {
    /// Builds the default options writing into `directory`.
    #[must_use]
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            ring_capacity: DEFAULT_RING_CAPACITY,
            level: LogLevel::default(),
            namespaces: DEFAULT_LOG_NAMESPACES.to_owned(),
            directory: directory.into(),
            format: LogFormat::default(),
        }
    }

    /// Iterates over the non-empty namespace globs.
    pub fn namespace_patterns(&self) -> impl Iterator<Item = &str> {
        self.namespaces
            .split(',')
            .map(str::trim)
            .filter(|pattern| !pattern.is_empty())
    }

    /// Path of the log file inside the target directory.
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(LOG_FILE_NAME)
    }

    /// Accessor for the target directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.directory.as_path()
    }
}
