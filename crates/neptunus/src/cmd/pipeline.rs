//! Pipeline command - admin API client
//!
//! Operates pipelines of a running daemon over its admin HTTP API.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Deserialize;

/// Admin client arguments
#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Admin API address of the daemon
    #[arg(long, default_value = "http://127.0.0.1:9600")]
    pub address: String,

    #[command(subcommand)]
    pub action: PipelineAction,
}

#[derive(Subcommand, Debug)]
pub enum PipelineAction {
    /// List loaded pipelines and their states
    List,

    /// Build and start a pipeline
    Start {
        /// Pipeline id
        id: String,
    },

    /// Stop a running pipeline and wait for it to drain
    Stop {
        /// Pipeline id
        id: String,
    },
}

#[derive(Debug, Deserialize)]
struct PipelineSummary {
    id: String,
    state: String,
    lines: usize,
    autostart: bool,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

pub async fn run(args: PipelineArgs) -> Result<()> {
    let client = reqwest::Client::new();
    match args.action {
        PipelineAction::List => {
            let response = client
                .get(format!("{}/pipelines", args.address))
                .send()
                .await
                .with_context(|| format!("daemon not reachable at {}", args.address))?;
            let pipelines: Vec<PipelineSummary> = response.json().await?;

            if pipelines.is_empty() {
                println!("no pipelines loaded");
                return Ok(());
            }
            println!("{:<24} {:<10} {:>5}  {}", "ID", "STATE", "LINES", "AUTOSTART");
            for p in pipelines {
                println!(
                    "{:<24} {:<10} {:>5}  {}",
                    p.id, p.state, p.lines, p.autostart
                );
            }
        }
        PipelineAction::Start { id } => {
            let response = client
                .post(format!("{}/pipelines/{}/start", args.address, id))
                .send()
                .await
                .with_context(|| format!("daemon not reachable at {}", args.address))?;
            check(response, &format!("pipeline '{id}' started")).await?;
        }
        PipelineAction::Stop { id } => {
            let response = client
                .post(format!("{}/pipelines/{}/stop", args.address, id))
                .send()
                .await
                .with_context(|| format!("daemon not reachable at {}", args.address))?;
            check(response, &format!("pipeline '{id}' stopped")).await?;
        }
    }
    Ok(())
}

async fn check(response: reqwest::Response, success: &str) -> Result<()> {
    if response.status().is_success() {
        println!("{success}");
        return Ok(());
    }
    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(body) => bail!("{}", body.error),
        Err(_) => bail!("daemon returned {status}"),
    }
}
