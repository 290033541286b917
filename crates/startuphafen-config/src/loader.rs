//! Layered configuration loader.
//!
//! A [`ConfigLoader`] owns an ordered list of JSON sources and a [`Schema`].
//! Every call to [`ConfigLoader::load_config`] runs a fresh pipeline:
//!
//! 1. Read and parse each source in list order, deep-merging it into an
//!    accumulator that starts as an empty object
//! 2. Overlay every `*.json` file of the secrets directory, sorted by name
//! 3. Optionally overlay prefixed environment variables
//! 4. Validate the result through the schema
//!
//! Later layers override earlier ones. Objects merge key by key, arrays and
//! scalars are replaced wholesale (see [`crate::merge`]).
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Sources, in the order given
//! 2. Secret files (`/run/secrets/*.json` by default)
//! 3. Environment variables (only with [`ConfigLoader::with_env`])
//!
//! # Environment Variable Mapping
//!
//! With `with_env("STARTUPHAFEN_")`, variables are mapped with `__` as the
//! nesting separator:
//!
//! - `STARTUPHAFEN_DATABASE__URL=postgres://db` → `database.url = "postgres://db"`
//! - `STARTUPHAFEN_SERVER__PORT=8080` → `server.port = 8080`
//!
//! # Example
//!
//! ```rust,ignore
//! use startuphafen_config::{ConfigLoader, Environment, ObjectSchema};
//!
//! // Explicit source list
//! let config = ConfigLoader::new(["config/base.json", "config/local.json"], schema)?
//!     .load_config()
//!     .await?;
//!
//! // Sources derived from the deployment environment
//! let config = ConfigLoader::for_environment("config", Environment::Production, schema)?
//!     .secrets_dir("/var/run/portal-secrets")
//!     .load_config()
//!     .await?;
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use figment::Figment;
use figment::providers::Env;
use serde_json::{Map, Value};
use tracing::{debug, info, trace};

use crate::environment::{Environment, environment_sources};
use crate::error::{ConfigError, ConfigResult};
use crate::files::{FileAccess, TokioFileAccess};
use crate::merge::deep_merge;
use crate::schema::Schema;

/// Conventional directory where runtime secrets are mounted.
pub const DEFAULT_SECRETS_DIR: &str = "/run/secrets";

/// File name suffix selecting which secrets directory entries are applied.
pub const SECRET_SUFFIX: &str = ".json";

/// Configuration loader for an ordered list of JSON sources.
pub struct ConfigLoader<S> {
    /// Ordered sources, later entries win.
    sources: Vec<PathBuf>,
    /// Schema validating the merged result.
    schema: S,
    /// Host file operations.
    files: Arc<dyn FileAccess>,
    /// Directory holding secret overlays.
    secrets_dir: PathBuf,
    /// Prefix of environment variables to overlay, if enabled.
    env_prefix: Option<String>,
}

impl<S: Schema> ConfigLoader<S> {
    /// Creates a loader for `sources`, which must not be empty.
    pub fn new<I, P>(sources: I, schema: S) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let sources: Vec<PathBuf> = sources.into_iter().map(Into::into).collect();
        if sources.is_empty() {
            return Err(ConfigError::NoSources);
        }

        Ok(Self {
            sources,
            schema,
            files: Arc::new(TokioFileAccess),
            secrets_dir: PathBuf::from(DEFAULT_SECRETS_DIR),
            env_prefix: None,
        })
    }

    /// Creates a loader whose sources are derived from `environment`.
    ///
    /// See [`Environment::source_fragments`] for the layering.
    pub fn for_environment(
        base_dir: impl AsRef<Path>,
        environment: Environment,
        schema: S,
    ) -> ConfigResult<Self> {
        Self::new(environment_sources(base_dir, environment), schema)
    }

    /// Replaces the file access implementation.
    pub fn with_file_access(mut self, files: Arc<dyn FileAccess>) -> Self {
        self.files = files;
        self
    }

    /// Sets the directory scanned for secret overlays.
    pub fn secrets_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.secrets_dir = path.as_ref().to_path_buf();
        self
    }

    /// Enables overlaying environment variables starting with `prefix`.
    pub fn with_env(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Disables the environment variable overlay (default).
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// The ordered source list.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Reads, merges and validates all layers.
    pub async fn load_config(&self) -> ConfigResult<S::Output> {
        let merged = self.merge_layers().await?;
        let config = self.schema.validate(merged)?;

        debug!(
            sources = self.sources.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the merged, not yet validated document.
    async fn merge_layers(&self) -> ConfigResult<Value> {
        let mut merged = Value::Object(Map::new());

        for path in &self.sources {
            info!(path = %path.display(), "Loading configuration source");
            let fragment = self.read_fragment(path).await?;
            deep_merge(&mut merged, fragment);
        }

        self.apply_secrets(&mut merged).await?;

        if let Some(prefix) = &self.env_prefix {
            trace!(prefix = %prefix, "Loading environment variables");
            deep_merge(&mut merged, env_overlay(prefix)?);
        }

        Ok(merged)
    }

    /// Reads and parses one JSON file.
    async fn read_fragment(&self, path: &Path) -> ConfigResult<Value> {
        let text = self
            .files
            .read_text_file(path)
            .await
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
                _ => ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                },
            })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merges every matching secret file, in lexical file name order.
    async fn apply_secrets(&self, merged: &mut Value) -> ConfigResult<()> {
        let entries = match self.files.read_dir(&self.secrets_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(
                    path = %self.secrets_dir.display(),
                    "Secrets directory not found, skipping secret overlay"
                );
                return Ok(());
            }
            Err(source) => {
                return Err(ConfigError::SecretsDir {
                    path: self.secrets_dir.clone(),
                    source,
                });
            }
        };

        let mut names: Vec<String> = entries
            .into_iter()
            .filter(|name| {
                let matches = name.ends_with(SECRET_SUFFIX);
                if !matches {
                    trace!(name = %name, "Ignoring secrets directory entry");
                }
                matches
            })
            .collect();
        names.sort();

        for name in names {
            let path = self.secrets_dir.join(&name);
            debug!(path = %path.display(), "Applying secret overlay");
            let fragment = self.read_fragment(&path).await?;
            deep_merge(merged, fragment);
        }

        Ok(())
    }
}

/// Collects prefixed environment variables into a nested JSON object.
fn env_overlay(prefix: &str) -> ConfigResult<Value> {
    let overlay = Figment::from(Env::prefixed(prefix).split("__"))
        .extract::<Value>()
        .map_err(Box::new)?;
    Ok(overlay)
}

/// Loads the configuration for `environment` from `base_dir`.
///
/// Shorthand for [`ConfigLoader::for_environment`] followed by
/// [`ConfigLoader::load_config`], with default file access and secrets
/// directory.
pub async fn load_environment_config<S: Schema>(
    base_dir: impl AsRef<Path>,
    environment: Environment,
    schema: S,
) -> ConfigResult<S::Output> {
    ConfigLoader::for_environment(base_dir, environment, schema)?
        .load_config()
        .await
}

// =============================================================================
// Tests
// =============================================================================
