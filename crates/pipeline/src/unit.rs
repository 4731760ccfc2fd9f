//! Soft-units - channel adapters around plugins
//!
//! Each plugin runs inside a thin wrapper that wires it to the
//! pipeline's channels and interposes its filter chain. Plugins never
//! see the topology; units never see plugin internals.
//!
//! # Filter chain
//!
//! A chain of K filters composes by feeding filter *i*'s rejected
//! stream into filter *i+1*; every filter's accepted stream goes
//! straight to the stage's accepted sink, and the last rejected stream
//! is the stage's rejected outcome. Acceptance is therefore an OR
//! across the chain, and an empty chain accepts everything.
//!
//! What "rejected" means depends on the stage:
//!
//! - input unit: rejected events are completed immediately
//! - processor unit: rejected events bypass the processor unchanged
//! - output unit: rejected events are completed immediately

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use neptunus_core::plugin::event_channel;
use neptunus_core::{CancellationToken, EventRx, EventTx, Filter, Input, Output, Processor};

use crate::metrics::PipelineMetrics;

/// An input plugin with its filter chain
pub(crate) struct InputSet {
    pub input: Box<dyn Input>,
    pub filters: Vec<Box<dyn Filter>>,
    pub alias: String,
}

/// A processor plugin with its filter chain
pub(crate) struct ProcSet {
    pub processor: Box<dyn Processor>,
    pub filters: Vec<Box<dyn Filter>>,
    pub alias: String,
}

/// An output plugin with its filter chain
pub(crate) struct OutputSet {
    pub output: Box<dyn Output>,
    pub filters: Vec<Box<dyn Filter>>,
    pub alias: String,
}

/// Drive an input plugin: plugin events flow through the filter chain,
/// accepted onto `out`, rejected completed on the spot
pub(crate) async fn run_input_unit(
    set: InputSet,
    stop: CancellationToken,
    out: EventTx,
    buffer: usize,
    metrics: Arc<PipelineMetrics>,
) {
    let InputSet {
        mut input,
        filters,
        alias,
    } = set;

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    if filters.is_empty() {
        input.set_channels(stop, out);
    } else {
        let (raw_tx, raw_rx) = event_channel(buffer);
        input.set_channels(stop, raw_tx);

        let (rejected_tx, rejected_rx) = event_channel(buffer);
        tasks.extend(spawn_filter_chain(
            filters,
            raw_rx,
            out,
            rejected_tx,
            buffer,
            &alias,
        ));
        tasks.push(tokio::spawn(complete_rejected(
            rejected_rx,
            alias.clone(),
            Arc::clone(&metrics),
        )));
    }

    input.run().await;
    if let Err(err) = input.close().await {
        warn!(input = %alias, error = %err, "input closed with error");
    }
    join_all(tasks, &alias).await;
}

/// Drive a processor plugin: accepted events go through the plugin,
/// rejected events pass through to `out` unchanged
pub(crate) async fn run_processor_unit(
    set: ProcSet,
    input: EventRx,
    out: EventTx,
    buffer: usize,
) {
    let ProcSet {
        mut processor,
        filters,
        alias,
    } = set;

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    if filters.is_empty() {
        processor.set_channels(input, out);
    } else {
        let (accepted_tx, accepted_rx) = event_channel(buffer);
        tasks.extend(spawn_filter_chain(
            filters,
            input,
            accepted_tx,
            out.clone(),
            buffer,
            &alias,
        ));
        processor.set_channels(accepted_rx, out);
    }

    processor.run().await;
    if let Err(err) = processor.close().await {
        warn!(processor = %alias, error = %err, "processor closed with error");
    }
    join_all(tasks, &alias).await;
}

/// Drive an output plugin: accepted events go to the plugin, rejected
/// events are completed on the spot
pub(crate) async fn run_output_unit(
    set: OutputSet,
    input: EventRx,
    buffer: usize,
    metrics: Arc<PipelineMetrics>,
) {
    let OutputSet {
        mut output,
        filters,
        alias,
    } = set;

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    if filters.is_empty() {
        output.set_channels(input);
    } else {
        let (accepted_tx, accepted_rx) = event_channel(buffer);
        let (rejected_tx, rejected_rx) = event_channel(buffer);
        tasks.extend(spawn_filter_chain(
            filters,
            input,
            accepted_tx,
            rejected_tx,
            buffer,
            &alias,
        ));
        tasks.push(tokio::spawn(complete_rejected(
            rejected_rx,
            alias.clone(),
            Arc::clone(&metrics),
        )));
        output.set_channels(accepted_rx);
    }

    output.run().await;
    if let Err(err) = output.close().await {
        warn!(output = %alias, error = %err, "output closed with error");
    }
    join_all(tasks, &alias).await;
}

/// Spawn a filter chain between `input` and the accepted/rejected sinks
///
/// Filter *i*'s rejected stream is filter *i+1*'s input; the last
/// filter's rejected stream is the stage outcome. One task per filter.
pub(crate) fn spawn_filter_chain(
    filters: Vec<Box<dyn Filter>>,
    input: EventRx,
    accepted: EventTx,
    rejected: EventTx,
    buffer: usize,
    stage: &str,
) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::with_capacity(filters.len());
    let last = filters.len().saturating_sub(1);
    let mut next_input = Some(input);

    for (index, mut filter) in filters.into_iter().enumerate() {
        let Some(filter_input) = next_input.take() else {
            break;
        };
        let reject_tx = if index == last {
            rejected.clone()
        } else {
            let (tx, rx) = event_channel(buffer);
            next_input = Some(rx);
            tx
        };
        filter.set_channels(filter_input, reject_tx, accepted.clone());

        let stage = stage.to_owned();
        tasks.push(tokio::spawn(async move {
            filter.run().await;
            if let Err(err) = filter.close().await {
                warn!(stage = %stage, error = %err, "filter closed with error");
            }
        }));
    }
    tasks
}

/// Complete every event on a stage's rejected stream
async fn complete_rejected(rejected: EventRx, stage: String, metrics: Arc<PipelineMetrics>) {
    while let Ok(event) = rejected.recv().await {
        debug!(stage = %stage, id = %event.id(), "event rejected");
        metrics.record_rejected();
        event.done();
    }
}

async fn join_all(tasks: Vec<JoinHandle<()>>, stage: &str) {
    for task in tasks {
        if let Err(err) = task.await {
            error!(stage = %stage, error = %err, "unit task panicked");
        }
    }
}

#[cfg(test)]
#[path = "unit_test.rs"]
mod tests;
