//! Pipeline - topology builder and runner
//!
//! Assembles the plugin graph from a declaration and drives it:
//!
//! ```text
//! inputs ──→ fusion ──→ [processor lines ×N] ──→ fusion ──→ broadcast ──→ outputs
//! ```
//!
//! One task per soft-unit and per fusion/broadcast node. Stop signals
//! go to inputs only; everything downstream terminates through channel
//! closure, which propagates from producers to consumers exactly.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use neptunus_config::{PipelineConfig, PluginConf, PluginSet};
use neptunus_core::plugin::event_channel;
use neptunus_core::{CancellationToken, Filter};
use neptunus_plugins::Registry;

use crate::broadcast::Broadcast;
use crate::error::BuildError;
use crate::fusion::Fusion;
use crate::metrics::PipelineMetrics;
use crate::state::{State, StateCell};
use crate::unit::{run_input_unit, run_output_unit, run_processor_unit, InputSet, OutputSet, ProcSet};

/// A configured pipeline: built plugin sets plus runtime state
pub struct Pipeline {
    config: PipelineConfig,
    state: Arc<StateCell>,
    metrics: Arc<PipelineMetrics>,

    ins: Vec<InputSet>,
    procs: Vec<Vec<ProcSet>>,
    outs: Vec<OutputSet>,
}

impl Pipeline {
    /// Wrap a declaration; no plugins are created until [`build`](Self::build)
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: Arc::new(StateCell::new()),
            metrics: Arc::new(PipelineMetrics::new()),
            ins: Vec::new(),
            procs: Vec::new(),
            outs: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.settings.id
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> State {
        self.state.get()
    }

    /// Shared state cell, valid after the pipeline moves into its task
    pub fn state_cell(&self) -> Arc<StateCell> {
        Arc::clone(&self.state)
    }

    /// Shared metrics handle
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Instantiate and configure every plugin the declaration names
    pub fn build(&mut self, registry: &Registry) -> Result<(), BuildError> {
        self.configure_inputs(registry)?;
        debug!(pipeline = %self.id(), "inputs configuration has no errors");

        self.configure_processors(registry)?;
        debug!(pipeline = %self.id(), "processors configuration has no errors");

        self.configure_outputs(registry)?;
        debug!(pipeline = %self.id(), "outputs configuration has no errors");

        Ok(())
    }

    /// Validate the declaration by performing a full build, reporting
    /// per-stage outcomes
    pub fn test(&mut self, registry: &Registry) -> Result<(), BuildError> {
        if let Err(err) = self.configure_inputs(registry) {
            error!(pipeline = %self.id(), error = %err, "inputs configuration test failed");
            return Err(err);
        }
        info!(pipeline = %self.id(), "inputs configuration has no errors");

        if let Err(err) = self.configure_processors(registry) {
            error!(pipeline = %self.id(), error = %err, "processors configuration test failed");
            return Err(err);
        }
        info!(pipeline = %self.id(), "processors configuration has no errors");

        if let Err(err) = self.configure_outputs(registry) {
            error!(pipeline = %self.id(), error = %err, "outputs configuration test failed");
            return Err(err);
        }
        info!(pipeline = %self.id(), "outputs configuration has no errors");

        info!(pipeline = %self.id(), "pipeline tested successfully");
        Ok(())
    }

    /// Run the built graph until the stop token fires and the graph
    /// drains, or until every input finishes on its own
    pub async fn run(mut self, stop: CancellationToken) {
        let id = self.config.settings.id.clone();
        let buffer = self.config.settings.buffer;
        let lines = self.config.settings.lines;

        info!(pipeline = %id, "starting pipeline");
        self.state.advance(State::Starting);

        let mut tasks: Vec<JoinHandle<()>> = Vec::new();

        info!(pipeline = %id, "starting inputs");
        let mut input_stops = Vec::with_capacity(self.ins.len());
        let mut input_outs = Vec::with_capacity(self.ins.len());
        for set in std::mem::take(&mut self.ins) {
            let token = CancellationToken::new();
            let (tx, rx) = event_channel(buffer);
            debug!(pipeline = %id, input = %set.alias, "input wired");
            input_stops.push(token.clone());
            input_outs.push(rx);
            tasks.push(tokio::spawn(run_input_unit(
                set,
                token,
                tx,
                buffer,
                Arc::clone(&self.metrics),
            )));
        }

        info!(pipeline = %id, "starting inputs-to-processors fusion");
        let (fusion_tx, mut stream) = event_channel(buffer);
        tasks.push(tokio::spawn(
            Fusion::new(
                "inputs-to-processors",
                id.clone(),
                input_outs,
                fusion_tx,
                Some(Arc::clone(&self.metrics)),
            )
            .run(),
        ));

        let procs = std::mem::take(&mut self.procs);
        if !procs.is_empty() {
            info!(pipeline = %id, lines, "starting processors");
            let mut line_outs = Vec::with_capacity(lines);
            for (line_index, line) in procs.into_iter().enumerate() {
                let mut line_stream = stream.clone();
                for set in line {
                    let (tx, rx) = event_channel(buffer);
                    debug!(pipeline = %id, line = line_index, processor = %set.alias, "processor wired");
                    tasks.push(tokio::spawn(run_processor_unit(set, line_stream, tx, buffer)));
                    line_stream = rx;
                }
                line_outs.push(line_stream);
                info!(pipeline = %id, line = line_index, "line started");
            }

            info!(pipeline = %id, "starting processors-to-broadcast fusion");
            let (fusion_tx, fusion_rx) = event_channel(buffer);
            tasks.push(tokio::spawn(
                Fusion::new(
                    "processors-to-broadcast",
                    id.clone(),
                    line_outs,
                    fusion_tx,
                    None,
                )
                .run(),
            ));
            stream = fusion_rx;
        }

        info!(pipeline = %id, "starting broadcast");
        let outs = std::mem::take(&mut self.outs);
        let mut broadcast_txs = Vec::with_capacity(outs.len());
        let mut broadcast_rxs = Vec::with_capacity(outs.len());
        for _ in &outs {
            let (tx, rx) = event_channel(buffer);
            broadcast_txs.push(tx);
            broadcast_rxs.push(rx);
        }
        tasks.push(tokio::spawn(
            Broadcast::new(id.clone(), stream, broadcast_txs, Arc::clone(&self.metrics)).run(),
        ));

        info!(pipeline = %id, "starting outputs");
        for (set, rx) in outs.into_iter().zip(broadcast_rxs) {
            debug!(pipeline = %id, output = %set.alias, "output wired");
            tasks.push(tokio::spawn(run_output_unit(
                set,
                rx,
                buffer,
                Arc::clone(&self.metrics),
            )));
        }

        self.state.advance(State::Running);
        info!(pipeline = %id, "pipeline started");

        // deliver cancellation to inputs only; the rest of the graph
        // drains through channel closure
        let watcher = {
            let id = id.clone();
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                stop.cancelled().await;
                info!(pipeline = %id, "stop signal received, stopping pipeline");
                state.advance(State::Stopping);
                for token in input_stops {
                    token.cancel();
                }
            })
        };

        for task in tasks {
            if let Err(err) = task.await {
                error!(pipeline = %id, error = %err, "pipeline task panicked");
            }
        }
        watcher.abort();

        self.state.advance(State::Stopped);
        let snapshot = self.metrics.snapshot();
        info!(
            pipeline = %id,
            ingested = snapshot.ingested,
            delivered = snapshot.delivered,
            rejected = snapshot.rejected,
            lost = snapshot.lost,
            "pipeline stopped"
        );
    }

    fn configure_inputs(&mut self, registry: &Registry) -> Result<(), BuildError> {
        if self.config.inputs.is_empty() {
            return Err(BuildError::NoInputs);
        }

        let id = self.config.settings.id.clone();
        for (index, set) in self.config.inputs.clone().iter().enumerate() {
            for (name, conf) in set {
                let mut input = registry
                    .create_input(name)
                    .ok_or_else(|| BuildError::unknown("input", name))?;

                let alias = conf
                    .alias()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("{name}-{index}"));

                input
                    .init(conf.table(), &alias, &id)
                    .map_err(|err| BuildError::init("input", name, err))?;

                if let Some((parser_name, parser_conf)) = conf.parser() {
                    let parser =
                        build_parser(registry, &parser_name, &parser_conf, &alias, &id)?;
                    input
                        .set_parser(parser)
                        .map_err(|err| BuildError::init("input", name, err))?;
                }

                let filters = self.configure_filters(registry, &conf.filters(), &alias)?;
                self.ins.push(InputSet {
                    input,
                    filters,
                    alias,
                });
            }
        }
        Ok(())
    }

    fn configure_processors(&mut self, registry: &Registry) -> Result<(), BuildError> {
        if self.config.processors.is_empty() {
            return Ok(());
        }

        let id = self.config.settings.id.clone();
        let processors = self.config.processors.clone();

        // one random id per configured processor, shared across lines
        let plugin_count: usize = processors.iter().map(PluginSet::len).sum();
        let plugin_ids: Vec<u64> = (0..plugin_count).map(|_| rand::random()).collect();

        // a safe deep copy of plugins is not possible, so every line
        // instantiates its own stack from the declaration
        for line in 0..self.config.settings.lines {
            let mut sets = Vec::with_capacity(plugin_count);
            let mut plugin_index = 0;
            for (index, set) in processors.iter().enumerate() {
                for (name, conf) in set {
                    let mut processor = registry
                        .create_processor(name)
                        .ok_or_else(|| BuildError::unknown("processor", name))?;

                    let alias = match conf.alias() {
                        Some(alias) => format!("{alias}-{line}"),
                        None => format!("{name}-{index}-{line}"),
                    };

                    processor
                        .init(conf.table(), &alias, &id)
                        .map_err(|err| BuildError::init("processor", name, err))?;
                    processor.set_id(plugin_ids[plugin_index]);
                    plugin_index += 1;

                    let filters = self.configure_filters(registry, &conf.filters(), &alias)?;
                    sets.push(ProcSet {
                        processor,
                        filters,
                        alias,
                    });
                }
            }
            self.procs.push(sets);
        }
        Ok(())
    }

    fn configure_outputs(&mut self, registry: &Registry) -> Result<(), BuildError> {
        if self.config.outputs.is_empty() {
            return Err(BuildError::NoOutputs);
        }

        let id = self.config.settings.id.clone();
        for (index, set) in self.config.outputs.clone().iter().enumerate() {
            for (name, conf) in set {
                let mut output = registry
                    .create_output(name)
                    .ok_or_else(|| BuildError::unknown("output", name))?;

                let alias = conf
                    .alias()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("{name}-{index}"));

                output
                    .init(conf.table(), &alias, &id)
                    .map_err(|err| BuildError::init("output", name, err))?;

                if let Some((serializer_name, serializer_conf)) = conf.serializer() {
                    let serializer = build_serializer(
                        registry,
                        &serializer_name,
                        &serializer_conf,
                        &alias,
                        &id,
                    )?;
                    output
                        .set_serializer(serializer)
                        .map_err(|err| BuildError::init("output", name, err))?;
                }

                let filters = self.configure_filters(registry, &conf.filters(), &alias)?;
                self.outs.push(OutputSet {
                    output,
                    filters,
                    alias,
                });
            }
        }
        Ok(())
    }

    fn configure_filters(
        &self,
        registry: &Registry,
        declared: &[(String, PluginConf)],
        parent: &str,
    ) -> Result<Vec<Box<dyn Filter>>, BuildError> {
        let id = &self.config.settings.id;
        let mut filters = Vec::with_capacity(declared.len());
        for (name, conf) in declared {
            let mut filter = registry
                .create_filter(name)
                .ok_or_else(|| BuildError::unknown("filter", name))?;

            let alias = conf
                .alias()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("{parent}-{name}"));

            filter
                .init(conf.table(), &alias, id)
                .map_err(|err| BuildError::init("filter", name, err))?;
            filters.push(filter);
        }
        Ok(filters)
    }
}

fn build_parser(
    registry: &Registry,
    name: &str,
    conf: &PluginConf,
    parent: &str,
    pipeline: &str,
) -> Result<Box<dyn neptunus_core::Parser>, BuildError> {
    let mut parser = registry
        .create_parser(name)
        .ok_or_else(|| BuildError::unknown("parser", name))?;
    parser
        .init(conf.table(), &format!("{parent}-{name}"), pipeline)
        .map_err(|err| BuildError::init("parser", name, err))?;
    Ok(parser)
}

fn build_serializer(
    registry: &Registry,
    name: &str,
    conf: &PluginConf,
    parent: &str,
    pipeline: &str,
) -> Result<Box<dyn neptunus_core::Serializer>, BuildError> {
    let mut serializer = registry
        .create_serializer(name)
        .ok_or_else(|| BuildError::unknown("serializer", name))?;
    serializer
        .init(conf.table(), &format!("{parent}-{name}"), pipeline)
        .map_err(|err| BuildError::init("serializer", name, err))?;
    Ok(serializer)
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
