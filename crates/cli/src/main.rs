//! Unidash CLI - university reporting dashboard client

mod commands;
mod config;
mod logging;
mod session_store;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "unidash")]
#[command(about = "Command-line client for the university reporting dashboard")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./unidash.toml or ./config/unidash.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Data directory for the saved session and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Timeout for commands in seconds (0 = no timeout; `watch` never times out)
    #[arg(short = 't', long, global = true, default_value = "60")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = config::resolve_data_dir(cli.data_dir);
    logging::init_logging(cli.log_level.into(), &data_dir, cli.no_file_log)?;
    let config = config::load_config(cli.config.as_deref())?;

    info!(api = %config.api.base_url, "starting unidash CLI");

    let limit = (cli.timeout > 0 && !cli.command.is_long_running())
        .then(|| Duration::from_secs(cli.timeout));
    let run = cli.command.execute(config, data_dir);

    let outcome = match limit {
        None => run.await,
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Command timed out after {} seconds", cli.timeout);
                std::process::exit(1);
            }
        },
    };

    if let Err(e) = outcome {
        error!("Command failed: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
