//! Environment-derived inputs to configuration assembly.
//!
//! Only the home directory and the host platform feed into assembly; both are
//! captured once so repeated assembly over the same [`Environment`] stays
//! deterministic.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Host platform families with distinct directory conventions.
#[derive(
    Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Platform {
    /// macOS.
    MacOs,
    /// Linux and other freedesktop systems.
    Linux,
    /// Windows.
    Windows,
    /// Anything else.
    Other,
}

impl Platform {
    /// Platform the binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }

    fn log_subdirectory(self) -> &'static [&'static str] {
        match self {
            Self::MacOs => &["Library", "Logs", "Kestrel"],
            Self::Linux => &[".local", "state", "kestrel", "logs"],
            Self::Windows => &["AppData", "Local", "Kestrel", "Logs"],
            Self::Other => &[".kestrel", "logs"],
        }
    }
}

/// Captured process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    home: Option<PathBuf>,
    platform: Platform,
}

impl Environment {
    /// Builds an environment from explicit values.
    #[must_use]
    pub const fn new(home: Option<PathBuf>, platform: Platform) -> Self {
        Self { home, platform }
    }

    /// Captures the current process environment.
    #[must_use]
    pub fn capture() -> Self {
        Self::new(dirs::home_dir(), Platform::current())
    }

    /// Home directory, when one is known.
    #[must_use]
    pub fn home(&self) -> Option<&PathBuf> {
        self.home.as_ref()
    }

    /// Platform family.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Directory receiving the log file on this platform.
    ///
    /// Falls back to the system temporary directory when no home directory is
    /// known.
    #[must_use]
    pub fn log_directory(&self) -> PathBuf {
        let mut directory = self.home.clone().unwrap_or_else(env::temp_dir);
        for component in self.platform.log_subdirectory() {
            directory.push(component);
        }
        directory
    }
}
