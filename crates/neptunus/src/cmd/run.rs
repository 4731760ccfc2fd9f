//! Run command - the daemon
//!
//! Loads every declaration under `--config`, builds and starts the
//! pipelines flagged with `run = true`, serves the admin API and stops
//! everything gracefully on SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::signal;
use tracing::info;

use neptunus_pipeline::PipelineServer;
use neptunus_plugins::Registry;

/// Daemon arguments
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pipeline declaration file or directory
    #[arg(short, long, default_value = "pipelines")]
    pub config: PathBuf,

    /// Admin API listen address
    #[arg(long, default_value = "127.0.0.1:9600")]
    pub http: String,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let configs = neptunus_config::load_path(&args.config)
        .with_context(|| format!("loading pipelines from '{}'", args.config.display()))?;
    anyhow::ensure!(
        !configs.is_empty(),
        "no pipeline declarations found in '{}'",
        args.config.display()
    );

    let server = Arc::new(PipelineServer::new(Registry::with_builtins()));
    for config in configs {
        server.add(config).await?;
    }

    server
        .start_autoruns()
        .await
        .context("autostart failed")?;

    let api = tokio::spawn(crate::api::serve(args.http.clone(), Arc::clone(&server)));
    info!(address = %args.http, "admin api listening");

    wait_for_shutdown().await;
    info!("shutdown signal received, stopping pipelines");

    server.stop_all().await;
    api.abort();
    info!("daemon stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
