//! Logging setup for Startuphafen processes.
//!
//! This module provides a unified logging setup using `tracing` and
//! `tracing-subscriber`. [`LoggingConfig`] is deserializable, so it can be a
//! section of the application's own configuration and be applied right
//! after [`ConfigLoader::load_config`](crate::ConfigLoader::load_config)
//! returns.
//!
//! # Configuration-Based Initialization
//!
//! ```rust,ignore
//! use startuphafen_config::logging;
//!
//! let config: PortalConfig = loader.load_config().await?;
//! logging::init_from_config(&config.logging);
//! ```
//!
//! # Manual Initialization
//!
//! ```rust,ignore
//! use startuphafen_config::logging::LoggingBuilder;
//!
//! LoggingBuilder::new()
//!     .directive("startuphafen_config=debug")
//!     .init();
//! ```

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::dispatcher::{self, DefaultGuard, Dispatch};
use tracing::warn;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt as tfmt};

use crate::schema::{FieldKind, ObjectRules};

// =============================================================================
// Logging Settings
// =============================================================================

/// Log verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug output.
    Debug,
    /// Informational output (default).
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Accepted level names.
    pub const NAMES: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Returns the level name as used in filter directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "invalid log level '{other}', expected one of: trace, debug, info, warn, error"
            )),
        }
    }
}

/// Output line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line compact output (default).
    #[default]
    Compact,
    /// Full single-line output.
    Full,
    /// Multi-line human readable output.
    Pretty,
    /// Newline-delimited JSON (requires the `json-log` feature).
    #[cfg(feature = "json-log")]
    Json,
}

impl LogFormat {
    /// Accepted format names.
    #[cfg(not(feature = "json-log"))]
    pub const NAMES: &'static [&'static str] = &["compact", "full", "pretty"];
    /// Accepted format names.
    #[cfg(feature = "json-log")]
    pub const NAMES: &'static [&'static str] = &["compact", "full", "pretty", "json"];
}

/// Output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard output (default).
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
    /// A log file, see [`LoggingConfig::file_path`].
    File,
}

impl LogOutput {
    /// Accepted output names.
    pub const NAMES: &'static [&'static str] = &["stdout", "stderr", "file"];
}

/// Logging section of an application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global level.
    pub level: LogLevel,
    /// Output line format.
    pub format: LogFormat,
    /// Output destination.
    pub output: LogOutput,
    /// Log file path when `output` is `file`.
    pub file_path: Option<PathBuf>,
    /// Include thread IDs.
    pub thread_ids: bool,
    /// Include source file and line.
    pub file_location: bool,
    /// Per-module level overrides, e.g. `{"startuphafen_config": "debug"}`.
    pub filters: BTreeMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Schema rules for a `logging` section, for use with
    /// [`FieldKind::Object`] inside an application schema.
    pub fn rules() -> ObjectRules {
        ObjectRules::new()
            .optional("level", FieldKind::OneOf(LogLevel::NAMES))
            .optional("format", FieldKind::OneOf(LogFormat::NAMES))
            .optional("output", FieldKind::OneOf(LogOutput::NAMES))
            .optional("file_path", FieldKind::String)
            .optional("thread_ids", FieldKind::Bool)
            .optional("file_location", FieldKind::Bool)
            .optional("filters", FieldKind::map_of(FieldKind::OneOf(LogLevel::NAMES)))
            .deny_unknown_fields()
    }
}

/// Initialize logging from a [`LoggingConfig`].
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).build().try_init();
}

// =============================================================================
// LoggingBuilder
// =============================================================================

/// A builder for configuring logging.
///
/// # Example
///
/// ```rust,ignore
/// use startuphafen_config::logging::{LogOutput, LoggingBuilder};
/// use tracing::Level;
///
/// LoggingBuilder::new()
///     .with_level(Level::DEBUG)
///     .output(LogOutput::Stderr)
///     .init();
/// ```
#[derive(Debug, Default)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: Option<tracing::Level>,
    format: LogFormat,
    output: LogOutput,
    thread_ids: bool,
    file_location: bool,
    file_path: Option<PathBuf>,
}

impl LoggingBuilder {
    /// Create a new logging builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a LoggingBuilder from a LoggingConfig.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let directives = config
            .filters
            .iter()
            .map(|(module, level)| format!("{module}={level}"))
            .collect();

        Self {
            directives,
            level: Some(config.level.to_tracing_level()),
            format: config.format,
            output: config.output,
            thread_ids: config.thread_ids,
            file_location: config.file_location,
            file_path: config.file_path.clone(),
        }
    }

    /// Set the global log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Add a filter directive such as `startuphafen_config=trace`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Set the output destination.
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Build the filter, returning the directives that failed to parse.
    fn build_filter(&self) -> (EnvFilter, Vec<String>) {
        let base_level = self.level.unwrap_or(tracing::Level::INFO);

        // RUST_LOG takes precedence over the configured base level
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(base_level.to_string().to_lowercase()));

        let mut warnings = Vec::new();
        for directive in &self.directives {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => warnings.push(format!("Ignoring invalid log directive {directive:?}: {e}")),
            }
        }

        (filter, warnings)
    }

    fn build_writer(&self, warnings: &mut Vec<String>) -> BoxMakeWriter {
        match (self.output, &self.file_path) {
            (LogOutput::Stdout, _) => BoxMakeWriter::new(std::io::stdout),
            (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
            (LogOutput::File, Some(path)) => BoxMakeWriter::new(tracing_appender::rolling::never(
                path.parent().unwrap_or_else(|| Path::new(".")),
                path.file_name()
                    .unwrap_or_else(|| OsStr::new("startuphafen.log")),
            )),
            (LogOutput::File, None) => {
                warnings.push(
                    "File output requested but no file path configured, falling back to stdout"
                        .to_string(),
                );
                BoxMakeWriter::new(std::io::stdout)
            }
        }
    }

    /// Assemble the subscriber without installing it.
    pub fn build(self) -> LoggingSetup {
        let (filter, mut warnings) = self.build_filter();
        let writer = self.build_writer(&mut warnings);

        let layer = tfmt::layer()
            .with_writer(writer)
            .with_thread_ids(self.thread_ids)
            .with_file(self.file_location)
            .with_line_number(self.file_location);
        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
        };

        let subscriber = tracing_subscriber::registry().with(layer).with(filter);
        LoggingSetup {
            dispatch: Dispatch::new(subscriber),
            warnings,
        }
    }

    /// Initialize the logging system.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Try to initialize the logging system, returning an error on failure.
    pub fn try_init(self) -> Result<(), TryInitError> {
        self.build().try_init()
    }
}

/// A subscriber assembled by [`LoggingBuilder::build`].
///
/// Problems found while building (invalid directives, a missing log file
/// path) are held back and logged through the subscriber once it is active.
pub struct LoggingSetup {
    dispatch: Dispatch,
    warnings: Vec<String>,
}

impl LoggingSetup {
    /// Problems found while building the subscriber.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Install as the global subscriber, ignoring an already installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Install as the global subscriber.
    pub fn try_init(self) -> Result<(), TryInitError> {
        self.dispatch.try_init()?;
        emit_warnings(&self.warnings);
        Ok(())
    }

    /// Install for the current thread until the guard is dropped.
    pub fn set_default(self) -> DefaultGuard {
        let guard = dispatcher::set_default(&self.dispatch);
        emit_warnings(&self.warnings);
        guard
    }
}

fn emit_warnings(warnings: &[String]) {
    for message in warnings {
        warn!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_logging_config_defaults_from_empty_object() {
        let config: LoggingConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.output, LogOutput::Stdout);
    }

    #[test]
    fn test_logging_config_deserializes() {
        let config: LoggingConfig = serde_json::from_value(json!({
            "level": "debug",
            "format": "pretty",
            "output": "file",
            "file_path": "/var/log/portal.log",
            "filters": {"hyper": "warn"}
        }))
        .unwrap();

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.output, LogOutput::File);
        assert_eq!(config.filters.get("hyper"), Some(&LogLevel::Warn));
    }

    #[test]
    fn test_builder_from_config_collects_directives() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            thread_ids: true,
            file_location: true,
            filters: BTreeMap::from([
                ("startuphafen_config".to_string(), LogLevel::Trace),
                ("tokio".to_string(), LogLevel::Error),
            ]),
            ..Default::default()
        };

        let builder = LoggingBuilder::from_config(&config);
        assert_eq!(builder.level, Some(tracing::Level::WARN));
        assert!(builder.thread_ids && builder.file_location);
        assert_eq!(
            builder.directives,
            vec![
                "startuphafen_config=trace".to_string(),
                "tokio=error".to_string()
            ]
        );
        assert!(builder.build().warnings().is_empty());
    }

    #[test]
    fn test_invalid_directive_is_reported() {
        let setup = LoggingBuilder::new()
            .directive("startuphafen_config=debug")
            .directive("hyper=loud")
            .build();
        assert_eq!(setup.warnings().len(), 1);
        assert!(setup.warnings()[0].contains("hyper=loud"));
    }

    #[test]
    fn test_file_output_without_path_is_reported() {
        let setup = LoggingBuilder::new().output(LogOutput::File).build();
        assert_eq!(setup.warnings().len(), 1);
        assert!(setup.warnings()[0].contains("no file path"));
    }

    #[test]
    fn test_file_output_from_config() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let log_file = tmp.path().join("portal.log");
        let config = LoggingConfig {
            level: LogLevel::Debug,
            output: LogOutput::File,
            file_path: Some(log_file.clone()),
            filters: BTreeMap::from([("hyper".to_string(), LogLevel::Error)]),
            ..Default::default()
        };

        let setup = LoggingBuilder::from_config(&config).build();
        {
            let _guard = setup.set_default();
            tracing::error!("portal logging reached the file");
        }

        let written = std::fs::read_to_string(&log_file).expect("log file");
        assert!(written.contains("portal logging reached the file"));
    }

    #[test]
    fn test_logging_rules_accept_config_and_reject_unknown_values() {
        use crate::schema::{ObjectSchema, Schema};

        let schema = ObjectSchema::<LoggingConfig>::from_rules(LoggingConfig::rules());
        let config = schema
            .validate(json!({"level": "warn", "filters": {"tokio": "error"}}))
            .unwrap();
        assert_eq!(config.level, LogLevel::Warn);

        let err = schema
            .validate(json!({"level": "loud", "format": "nope", "filters": {"tokio": 3}}))
            .unwrap_err();
        assert!(err.has_issue_at("level"));
        assert!(err.has_issue_at("format"));
        assert!(err.has_issue_at("filters.tokio"));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert!(LogLevel::NAMES.contains(&LogLevel::Error.as_str()));
    }
}
