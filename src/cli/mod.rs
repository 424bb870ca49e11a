//! CLI module for the irrigo proxy
//!
//! - `serve`: install and activate the worker, then serve
//! - `install`: install and activate once against the configured storage, then exit

pub mod install;
pub mod serve;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Irrigo - offline caching proxy for the irrigation controller
#[derive(Parser)]
#[command(name = "irrigo-proxy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install the worker and serve requests
    Serve,

    /// Pre-warm the cache storage and exit
    Install,
}

/// Loads `.env` and layered configuration, then installs logging
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);
    Ok(config)
}
