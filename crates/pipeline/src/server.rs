//! Pipeline server - in-process pipeline management
//!
//! Holds the loaded pipeline declarations and drives their lifecycles:
//! starting spawns a freshly built pipeline onto the runtime, stopping
//! cancels it and waits for the drain. A stopped pipeline is rebuilt
//! from its declaration on the next start.
//!
//! The daemon owns one server; the admin API and CLI operate through
//! it.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

use neptunus_config::PipelineConfig;
use neptunus_core::CancellationToken;
use neptunus_plugins::Registry;

use crate::error::ServerError;
use crate::pipeline::Pipeline;
use crate::state::{State, StateCell};

/// Observable pipeline summary
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineInfo {
    pub id: String,
    pub state: State,
    pub lines: usize,
    pub autostart: bool,
}

struct Runtime {
    state: Arc<StateCell>,
    stop: CancellationToken,
    task: JoinHandle<()>,
}

struct Entry {
    config: PipelineConfig,
    runtime: Option<Runtime>,
}

impl Entry {
    fn state(&self) -> State {
        match &self.runtime {
            Some(runtime) => runtime.state.get(),
            None => State::Created,
        }
    }
}

/// Manager of loaded pipelines
pub struct PipelineServer {
    registry: Registry,
    pipelines: Mutex<BTreeMap<String, Entry>>,
}

impl PipelineServer {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            pipelines: Mutex::new(BTreeMap::new()),
        }
    }

    /// Load a declaration; ids must be unique
    pub async fn add(&self, config: PipelineConfig) -> Result<(), ServerError> {
        let id = config.settings.id.clone();
        let mut pipelines = self.pipelines.lock().await;
        if pipelines.contains_key(&id) {
            return Err(ServerError::DuplicatePipeline { id });
        }
        info!(pipeline = %id, "pipeline loaded");
        pipelines.insert(
            id,
            Entry {
                config,
                runtime: None,
            },
        );
        Ok(())
    }

    /// Summaries of every loaded pipeline
    pub async fn list(&self) -> Vec<PipelineInfo> {
        let pipelines = self.pipelines.lock().await;
        pipelines
            .iter()
            .map(|(id, entry)| PipelineInfo {
                id: id.clone(),
                state: entry.state(),
                lines: entry.config.settings.lines,
                autostart: entry.config.settings.run,
            })
            .collect()
    }

    /// Summary of one pipeline
    pub async fn info(&self, id: &str) -> Result<PipelineInfo, ServerError> {
        let pipelines = self.pipelines.lock().await;
        let entry = pipelines.get(id).ok_or_else(|| ServerError::unknown(id))?;
        Ok(PipelineInfo {
            id: id.to_owned(),
            state: entry.state(),
            lines: entry.config.settings.lines,
            autostart: entry.config.settings.run,
        })
    }

    /// Build the pipeline from its declaration and spawn it
    pub async fn start(&self, id: &str) -> Result<(), ServerError> {
        let mut pipelines = self.pipelines.lock().await;
        let entry = pipelines
            .get_mut(id)
            .ok_or_else(|| ServerError::unknown(id))?;

        if matches!(
            entry.state(),
            State::Starting | State::Running | State::Stopping
        ) {
            return Err(ServerError::AlreadyRunning { id: id.to_owned() });
        }

        let mut pipeline = Pipeline::new(entry.config.clone());
        pipeline.build(&self.registry)?;

        let state = pipeline.state_cell();
        let stop = CancellationToken::new();
        let task = tokio::spawn(pipeline.run(stop.clone()));
        entry.runtime = Some(Runtime { state, stop, task });
        Ok(())
    }

    /// Cancel the pipeline and wait for it to drain
    pub async fn stop(&self, id: &str) -> Result<(), ServerError> {
        let runtime = {
            let mut pipelines = self.pipelines.lock().await;
            let entry = pipelines
                .get_mut(id)
                .ok_or_else(|| ServerError::unknown(id))?;

            if !matches!(entry.state(), State::Starting | State::Running) {
                return Err(ServerError::NotRunning { id: id.to_owned() });
            }
            // the lock is not held across the drain
            entry.runtime.take()
        };

        if let Some(runtime) = runtime {
            runtime.stop.cancel();
            if let Err(err) = runtime.task.await {
                error!(pipeline = %id, error = %err, "pipeline task panicked");
            }
        }
        Ok(())
    }

    /// Start every pipeline declared with `run = true`
    pub async fn start_autoruns(&self) -> Result<(), ServerError> {
        let autoruns: Vec<String> = {
            let pipelines = self.pipelines.lock().await;
            pipelines
                .iter()
                .filter(|(_, entry)| entry.config.settings.run)
                .map(|(id, _)| id.clone())
                .collect()
        };
        for id in autoruns {
            self.start(&id).await?;
        }
        Ok(())
    }

    /// Stop every running pipeline, waiting for each to drain
    pub async fn stop_all(&self) {
        let ids: Vec<String> = {
            let pipelines = self.pipelines.lock().await;
            pipelines.keys().cloned().collect()
        };
        for id in ids {
            match self.stop(&id).await {
                Ok(()) | Err(ServerError::NotRunning { .. }) => {}
                Err(err) => error!(pipeline = %id, error = %err, "pipeline stop failed"),
            }
        }
    }
}
