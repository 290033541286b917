//! Deployment environments and the source files each one layers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

/// Environment variable selecting the deployment environment.
pub const ENVIRONMENT_VAR: &str = "STARTUPHAFEN_ENV";

/// File extension of every configuration source.
pub const SOURCE_EXTENSION: &str = "json";

/// Deployment environment of a Startuphafen process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    /// Local development (default).
    #[default]
    Development,
    /// Automated test runs.
    Test,
    /// Pre-production staging.
    Staging,
    /// Production. Layers the staging overlay first.
    Production,
}

impl Environment {
    /// All environments, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Development,
        Self::Test,
        Self::Staging,
        Self::Production,
    ];

    /// Returns the environment name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Reads [`ENVIRONMENT_VAR`], defaulting to `Development` when unset.
    pub fn from_env() -> ConfigResult<Self> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Ordered file stems layered for this environment, base first.
    pub fn source_fragments(&self) -> &'static [&'static str] {
        match self {
            Self::Development => &["base"],
            Self::Test => &["base", "test"],
            Self::Staging => &["base", "staging"],
            Self::Production => &["base", "staging", "production"],
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "staging" | "stage" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::UnknownEnvironment(s.to_string())),
        }
    }
}

/// Builds the ordered source list for `environment` under `base_dir`.
pub fn environment_sources(base_dir: impl AsRef<Path>, environment: Environment) -> Vec<PathBuf> {
    let base_dir = base_dir.as_ref();
    environment
        .source_fragments()
        .iter()
        .map(|stem| base_dir.join(format!("{stem}.{SOURCE_EXTENSION}")))
        .collect()
}
