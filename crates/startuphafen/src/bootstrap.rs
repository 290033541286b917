//! Process startup: pick the environment, then load its configuration.
//!
//! Services call this once before anything else and exit on error rather
//! than run with partial configuration.

use std::path::{Path, PathBuf};

use startuphafen_config::{ConfigLoader, ConfigResult, Environment, Schema};
use tracing::info;

/// Prefix of environment variables overlaid by [`Bootstrap::with_env`].
pub const CONFIG_ENV_PREFIX: &str = "STARTUPHAFEN_CONFIG__";

/// Startup configuration for a Startuphafen service.
///
/// # Example
///
/// ```rust,ignore
/// let config = Bootstrap::new("config")
///     .environment(Environment::Staging)
///     .with_env()
///     .load(schema)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Bootstrap {
    base_dir: PathBuf,
    environment: Option<Environment>,
    secrets_dir: Option<PathBuf>,
    env_prefix: Option<String>,
}

impl Bootstrap {
    /// Creates a bootstrap reading sources from `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            environment: None,
            secrets_dir: None,
            env_prefix: None,
        }
    }

    /// Fixes the environment instead of reading `STARTUPHAFEN_ENV`.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Overrides the secrets directory.
    pub fn secrets_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.secrets_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Overlays `STARTUPHAFEN_CONFIG__*` environment variables.
    pub fn with_env(self) -> Self {
        self.env_prefix(CONFIG_ENV_PREFIX)
    }

    /// Overlays environment variables with a custom prefix.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// The explicit environment, or the one named by `STARTUPHAFEN_ENV`.
    pub fn resolve_environment(&self) -> ConfigResult<Environment> {
        match self.environment {
            Some(environment) => Ok(environment),
            None => Environment::from_env(),
        }
    }

    /// Builds the loader without running it.
    pub fn loader<S: Schema>(&self, schema: S) -> ConfigResult<ConfigLoader<S>> {
        let environment = self.resolve_environment()?;
        let mut loader = ConfigLoader::for_environment(&self.base_dir, environment, schema)?;
        if let Some(dir) = &self.secrets_dir {
            loader = loader.secrets_dir(dir);
        }
        if let Some(prefix) = &self.env_prefix {
            loader = loader.with_env(prefix.clone());
        }

        info!(
            environment = %environment,
            base_dir = %self.base_dir.display(),
            "Bootstrapping configuration"
        );

        Ok(loader)
    }

    /// Loads and validates the configuration.
    pub async fn load<S: Schema>(self, schema: S) -> ConfigResult<S::Output> {
        self.loader(schema)?.load_config().await
    }
}
