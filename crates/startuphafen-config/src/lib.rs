//! Startuphafen Config - deterministic layered configuration loading.
//!
//! This crate provides:
//! - Ordered JSON sources deep-merged into one document (`ConfigLoader`)
//! - Secret overlays from a mounted secrets directory
//! - Environment-specific source layering (`Environment`)
//! - Schema validation reporting every offending field (`Schema`, `ObjectSchema`)
//! - Logging configuration
//!
//! # Merge Rules
//!
//! ```text
//! object + object  → merged key by key, recursively
//! anything + other → later value replaces the earlier one (arrays included)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use startuphafen_config::{ConfigLoader, Environment, FieldKind, ObjectSchema};
//!
//! #[derive(serde::Deserialize)]
//! struct PortalConfig {
//!     port: u16,
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let schema = ObjectSchema::<PortalConfig>::new().required("port", FieldKind::Integer);
//!
//!     let config = ConfigLoader::for_environment("config", Environment::from_env()?, schema)?
//!         .load_config()
//!         .await?;
//!
//!     println!("listening on {}", config.port);
//!     Ok(())
//! }
//! ```

pub mod environment;
pub mod error;
pub mod files;
pub mod loader;
pub mod logging;
pub mod merge;
pub mod schema;

#[cfg(test)]
mod arbitrary;

// Re-exports
pub use environment::{ENVIRONMENT_VAR, Environment, environment_sources};
pub use error::{ConfigError, ConfigResult, FieldIssue, ValidationError};
pub use files::{FileAccess, MemoryFileAccess, TokioFileAccess};
pub use loader::{ConfigLoader, DEFAULT_SECRETS_DIR, SECRET_SUFFIX, load_environment_config};
pub use logging::{LogFormat, LogLevel, LogOutput, LoggingBuilder, LoggingConfig, LoggingSetup};
pub use schema::{FieldKind, FnSchema, ObjectRules, ObjectSchema, Schema, schema_fn};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `instrument` attribute
pub mod prelude {
    pub use tracing::{debug, error, info, instrument, trace, warn};
}
