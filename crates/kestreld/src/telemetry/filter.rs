//! Severity and namespace filtering shared by every log sink.

use std::sync::Arc;

use glob::Pattern;
use kestrel_config::{LogLevel, LogOptions};
use tracing::Metadata;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::{Context, Filter};

use super::TelemetryError;

/// Converts a tracing target into its dotted namespace.
pub(crate) fn namespace_of(target: &str) -> String {
    target.replace("::", ".")
}

pub(crate) const fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
    }
}

/// Passes metadata at or above the minimum level whose namespace matches one
/// of the configured globs.
#[derive(Debug, Clone)]
pub struct NamespaceFilter {
    patterns: Arc<[Pattern]>,
    level: LevelFilter,
}

impl NamespaceFilter {
    /// Compiles the filter described by the log options.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Filter`] when a glob fails to compile.
    pub fn from_options(options: &LogOptions) -> Result<Self, TelemetryError> {
        let patterns = options
            .namespace_patterns()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|error| TelemetryError::Filter {
                    pattern: pattern.to_owned(),
                    message: error.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns: patterns.into(),
            level: level_filter(options.level),
        })
    }

    /// Returns `true` when an event with this level and target is retained.
    #[must_use]
    pub fn allows(&self, level: &tracing::Level, target: &str) -> bool {
        if self.level < *level {
            return false;
        }
        let namespace = namespace_of(target);
        self.patterns
            .iter()
            .any(|pattern| pattern.matches(&namespace))
    }
}

impl<S> Filter<S> for NamespaceFilter {
    fn enabled(&self, metadata: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        self.allows(metadata.level(), metadata.target())
    }

    fn max_level_hint(&self) -> Option<LevelFilter> {
        Some(self.level)
    }
}
