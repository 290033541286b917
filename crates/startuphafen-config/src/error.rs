//! Configuration error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The loader was constructed without any source.
    #[error("Configuration loader needs at least one source")]
    NoSources,

    /// A declared configuration file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Failed to read a configuration file.
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        /// The file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file does not contain valid JSON.
    #[error("Failed to parse JSON configuration {}: {source}", path.display())]
    Parse {
        /// The file with invalid content.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The secrets directory exists but could not be listed.
    #[error("Failed to list secrets directory {}: {source}", path.display())]
    SecretsDir {
        /// The secrets directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Environment variable overlay could not be extracted.
    #[error("Environment variable error: {0}")]
    Env(#[from] Box<figment::Error>),

    /// Environment tag that is not one of the known environments.
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    /// The merged configuration does not match the schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    /// Returns the validation diagnostics if this is a schema mismatch.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// One offending field reported by a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Dotted path of the field, empty for the document root.
    pub path: String,
    /// What the schema expected at this path.
    pub expected: String,
    /// What was actually found.
    pub actual: String,
}

impl FieldIssue {
    /// Creates a new field issue.
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "(root)"
        } else {
            self.path.as_str()
        };
        write!(f, "{path}: expected {}, found {}", self.expected, self.actual)
    }
}

/// Structured schema mismatch listing every offending field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Creates a validation error from the collected issues.
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    /// Creates a validation error with a single issue.
    pub fn single(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(vec![FieldIssue::new(path, expected, actual)])
    }

    /// All offending fields, in document order.
    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Returns `true` if some issue was reported for `path`.
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid configuration ({} issue", self.issues.len())?;
        if self.issues.len() != 1 {
            f.write_str("s")?;
        }
        f.write_str(")")?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
