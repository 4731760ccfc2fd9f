//! Neptunus - pluggable event-processing engine
//!
//! # Usage
//!
//! ```bash
//! # Start the daemon with all autorun pipelines
//! neptunus run --config pipelines/
//!
//! # Validate declarations without starting anything
//! neptunus test --config pipelines/http-to-log.toml
//!
//! # Operate a running daemon
//! neptunus pipeline list
//! neptunus pipeline start http-to-log
//! neptunus pipeline stop http-to-log
//! ```

mod api;
mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pluggable event-processing engine
#[derive(Parser, Debug)]
#[command(name = "neptunus")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load pipelines and run all with the autostart flag
    Run(cmd::run::RunArgs),

    /// Validate pipeline declarations, exit non-zero on failure
    Test(cmd::test::TestArgs),

    /// Operate pipelines of a running daemon
    Pipeline(cmd::pipeline::PipelineArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Command::Run(args) => cmd::run::run(args).await,
        Command::Test(args) => cmd::test::run(args).await,
        Command::Pipeline(args) => cmd::pipeline::run(args).await,
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    Ok(())
}
