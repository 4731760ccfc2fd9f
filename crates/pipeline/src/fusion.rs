//! Fusion - fan-in node
//!
//! Merges N event streams into one. Order within each source stream is
//! preserved; interleaving between sources is arbitrary. The merged
//! stream closes only after every source stream has closed.

use std::sync::Arc;

use tracing::{debug, error};

use neptunus_core::{EventRx, EventTx};

use crate::metrics::PipelineMetrics;

/// N-to-1 stream merge
pub(crate) struct Fusion {
    name: &'static str,
    pipeline: String,
    inputs: Vec<EventRx>,
    out: EventTx,
    /// Counts merged events on the input side of the pipeline only
    metrics: Option<Arc<PipelineMetrics>>,
}

impl Fusion {
    pub fn new(
        name: &'static str,
        pipeline: impl Into<String>,
        inputs: Vec<EventRx>,
        out: EventTx,
        metrics: Option<Arc<PipelineMetrics>>,
    ) -> Self {
        Self {
            name,
            pipeline: pipeline.into(),
            inputs,
            out,
            metrics,
        }
    }

    /// Forward until every source closes; one forwarder per source so a
    /// slow source never blocks its siblings
    pub async fn run(mut self) {
        debug!(pipeline = %self.pipeline, fusion = self.name, sources = self.inputs.len(), "fusion started");

        let mut forwarders = Vec::with_capacity(self.inputs.len());
        for input in self.inputs.drain(..) {
            let out = self.out.clone();
            let metrics = self.metrics.clone();
            forwarders.push(tokio::spawn(async move {
                while let Ok(event) = input.recv().await {
                    if let Some(metrics) = &metrics {
                        metrics.record_ingested();
                    }
                    if let Err(send_error) = out.send(event).await {
                        // out side is gone; complete what we hold and stop
                        send_error.0.done();
                        break;
                    }
                }
            }));
        }
        // the forwarders hold the only remaining senders
        drop(self.out);

        for forwarder in forwarders {
            if let Err(err) = forwarder.await {
                error!(pipeline = %self.pipeline, fusion = self.name, error = %err, "fusion forwarder panicked");
            }
        }
        debug!(pipeline = %self.pipeline, fusion = self.name, "fusion stopped");
    }
}
