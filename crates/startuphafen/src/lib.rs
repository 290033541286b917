//! # Startuphafen
//!
//! Configuration bootstrap for the Startuphafen portal backend.
//!
//! ## Overview
//!
//! Every service loads its configuration the same way at startup:
//!
//! ```text
//! base.json ─▶ staging.json ─▶ production.json ─▶ /run/secrets/*.json ─▶ env ─▶ schema
//!   (always)    (staging+prod)    (prod only)         (sorted by name)     (opt-in)
//! ```
//!
//! - **Sources**: ordered JSON files, later ones win
//! - **Secrets**: JSON files mounted at runtime, merged after all sources
//! - **Schema**: validates the merged document and produces the typed config
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use startuphafen::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let schema = ObjectSchema::<PortalConfig>::new()
//!         .required("database", FieldKind::Object(ObjectRules::new()));
//!
//!     let config = Bootstrap::new("config").with_env().load(schema).await?;
//!     logging::init_from_config(&config.logging);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `json-log`: Enable JSON log output

pub mod bootstrap;

pub use startuphafen_config as config;
pub use startuphafen_config::logging;

pub use bootstrap::{Bootstrap, CONFIG_ENV_PREFIX};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use startuphafen::prelude::*;
/// ```
pub mod prelude {
    // Startup entry point
    pub use crate::bootstrap::Bootstrap;

    // Loader and environments
    pub use startuphafen_config::{ConfigError, ConfigLoader, ConfigResult, Environment};

    // Schema building blocks
    pub use startuphafen_config::{FieldKind, ObjectRules, ObjectSchema, Schema, schema_fn};

    // Logging
    pub use startuphafen_config::logging::{self, LoggingBuilder, LoggingConfig};
}
