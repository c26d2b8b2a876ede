//! Spool - buffered write coalescer
//!
//! # Usage
//!
//! ```bash
//! # Buffer NDJSON envelopes from stdin and flush them to ClickHouse
//! spool --config configs/spool.toml ingest
//!
//! # Read from a file instead
//! spool ingest --input records.ndjson
//!
//! # Validate a config file
//! spool --config configs/spool.toml check-config
//! ```

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spool_config::{Config, LogConfig, LogFormat, LogLevel};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Spool - buffered multi-destination write coalescer
#[derive(Parser, Debug)]
#[command(name = "spool")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, env = "SPOOL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read record envelopes and write them through the coalescer
    Ingest(cmd::ingest::IngestArgs),

    /// Validate the configuration and print the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Ingest(args) => {
            init_logging(&config.log, cli.log_level)?;
            cmd::ingest::run(config, args).await
        }
        Command::CheckConfig => cmd::check::run(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(log: &LogConfig, level_override: Option<LogLevel>) -> Result<()> {
    let level = log.effective_level(level_override);
    let filter = EnvFilter::try_new(level.as_str())
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    // Logs go to stderr so the stdout store's output stays clean
    match log.format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }

    Ok(())
}
