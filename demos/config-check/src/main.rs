//! Config Check
//!
//! Loads a Startuphafen configuration directory the same way the portal
//! backend does at startup and prints the validated result as JSON.
//!
//! ```text
//! config/
//! ├── base.json          always loaded
//! ├── test.json          --env test
//! ├── staging.json       --env staging, --env production
//! └── production.json    --env production
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package config-check -- ./config --env production --secrets-dir ./secrets
//! ```
//!
//! Exits with a non-zero status if any source is missing, malformed, or the
//! merged document does not match the portal schema.

mod portal;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde_json::Value;
use startuphafen::config::{LogLevel, LogOutput, LoggingSetup};
use startuphafen::prelude::*;
use tracing::info;

use crate::portal::portal_schema;

#[derive(Debug, Parser)]
#[command(name = "config-check", version, about)]
struct Args {
    /// Directory holding base.json and the environment overlays.
    dir: PathBuf,

    /// Environment to load (development, test, staging, production).
    /// Defaults to $STARTUPHAFEN_ENV, then development.
    #[arg(long)]
    env: Option<Environment>,

    /// Directory with secret overlays.
    #[arg(long)]
    secrets_dir: Option<PathBuf>,

    /// Overlay environment variables with this prefix.
    #[arg(long)]
    env_prefix: Option<String>,

    /// Skip the portal schema and accept any JSON object.
    #[arg(long)]
    raw: bool,

    /// Log level for diagnostics written to stderr. Overrides the level of
    /// the loaded `logging` section.
    #[arg(long)]
    log_level: Option<LogLevel>,
}

/// Logging used while the configuration itself is being loaded.
fn startup_logging(level: Option<LogLevel>) -> LoggingSetup {
    LoggingBuilder::new()
        .with_level(level.unwrap_or(LogLevel::Warn).to_tracing_level())
        .output(LogOutput::Stderr)
        .build()
}

/// The loaded `logging` section with command line overrides applied.
///
/// Stdout carries the rendered document, so stdout logging moves to stderr.
fn effective_logging(config: &LoggingConfig, level: Option<LogLevel>) -> LoggingConfig {
    let mut config = config.clone();
    if let Some(level) = level {
        config.level = level;
    }
    if config.output == LogOutput::Stdout {
        config.output = LogOutput::Stderr;
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut bootstrap = Bootstrap::new(&args.dir);
    if let Some(env) = args.env {
        bootstrap = bootstrap.environment(env);
    }
    if let Some(dir) = &args.secrets_dir {
        bootstrap = bootstrap.secrets_dir(dir);
    }
    if let Some(prefix) = &args.env_prefix {
        bootstrap = bootstrap.env_prefix(prefix.clone());
    }

    let rendered = if args.raw {
        startup_logging(args.log_level).init();
        let config: Value = bootstrap.load(ObjectSchema::<Value>::new()).await?;
        serde_json::to_string_pretty(&config)?
    } else {
        let config = {
            let _startup = startup_logging(args.log_level).set_default();
            bootstrap.load(portal_schema()).await?
        };
        logging::init_from_config(&effective_logging(&config.logging, args.log_level));
        info!(
            port = config.server.port,
            tenants = config.tenants.len(),
            "Portal configuration is valid"
        );
        serde_json::to_string_pretty(&config)?
    };

    println!("{rendered}");
    Ok(())
}
