//! Broadcast - fan-out node
//!
//! Duplicates each incoming event to every output channel: M-1 clones
//! plus the original, so the shared duty counter rises by M-1 per
//! event. Sends block, which propagates a slow output's backpressure to
//! all of its siblings and on upstream. Order is preserved within each
//! destination channel.

use std::sync::Arc;

use tracing::{debug, error};

use neptunus_core::{EventRx, EventTx};

use crate::metrics::PipelineMetrics;

/// 1-to-M event duplication
pub(crate) struct Broadcast {
    pipeline: String,
    input: EventRx,
    outs: Vec<EventTx>,
    metrics: Arc<PipelineMetrics>,
}

impl Broadcast {
    pub fn new(
        pipeline: impl Into<String>,
        input: EventRx,
        outs: Vec<EventTx>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            pipeline: pipeline.into(),
            input,
            outs,
            metrics,
        }
    }

    pub async fn run(self) {
        debug!(pipeline = %self.pipeline, destinations = self.outs.len(), "broadcast started");

        while let Ok(event) = self.input.recv().await {
            self.metrics.record_delivered();
            let Some((last, rest)) = self.outs.split_last() else {
                // nothing to deliver to; account for the event anyway
                error!(pipeline = %self.pipeline, "broadcast has no destinations");
                event.done();
                continue;
            };

            for out in rest {
                let copy = event.clone();
                if let Err(send_error) = out.send(copy).await {
                    self.metrics.record_lost();
                    send_error.0.done();
                }
            }
            if let Err(send_error) = last.send(event).await {
                self.metrics.record_lost();
                send_error.0.done();
            }
        }

        debug!(pipeline = %self.pipeline, "broadcast stopped");
    }
}
