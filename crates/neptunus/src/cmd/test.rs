//! Test command - declaration validation
//!
//! Builds every pipeline without starting anything; the process exit
//! code reports whether the whole set is valid.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{error, info};

use neptunus_pipeline::Pipeline;
use neptunus_plugins::Registry;

/// Validation arguments
#[derive(Args, Debug)]
pub struct TestArgs {
    /// Pipeline declaration file or directory
    #[arg(short, long, default_value = "pipelines")]
    pub config: PathBuf,
}

pub async fn run(args: TestArgs) -> Result<()> {
    let configs = neptunus_config::load_path(&args.config)
        .with_context(|| format!("loading pipelines from '{}'", args.config.display()))?;
    anyhow::ensure!(
        !configs.is_empty(),
        "no pipeline declarations found in '{}'",
        args.config.display()
    );

    let registry = Registry::with_builtins();
    let mut failures = 0usize;
    for config in configs {
        let id = config.settings.id.clone();
        let mut pipeline = Pipeline::new(config);
        match pipeline.test(&registry) {
            Ok(()) => info!(pipeline = %id, "configuration is valid"),
            Err(err) => {
                error!(pipeline = %id, error = %err, "configuration test failed");
                failures += 1;
            }
        }
    }

    anyhow::ensure!(failures == 0, "{failures} pipeline(s) failed validation");
    info!("all pipelines tested successfully");
    Ok(())
}
