//! Drop processor - swallows every event
//!
//! Completes each consumed event and emits nothing. Combine with
//! filters to discard a selected slice of the stream.

use async_trait::async_trait;
use tracing::{debug, info};

use neptunus_core::{EventRx, EventTx, PluginError, Processor};

/// Swallows every event it receives
#[derive(Default)]
pub struct Drop {
    alias: String,
    pipeline: String,
    input: Option<EventRx>,
}

#[async_trait]
impl Processor for Drop {
    fn init(
        &mut self,
        _conf: &toml::Table,
        alias: &str,
        pipeline: &str,
    ) -> Result<(), PluginError> {
        self.alias = alias.to_owned();
        self.pipeline = pipeline.to_owned();
        Ok(())
    }

    fn set_channels(&mut self, input: EventRx, _out: EventTx) {
        self.input = Some(input);
    }

    async fn run(&mut self) {
        let Some(input) = self.input.take() else {
            return;
        };
        while let Ok(event) = input.recv().await {
            debug!(
                pipeline = %self.pipeline,
                processor = %self.alias,
                id = %event.id(),
                "event dropped"
            );
            event.done();
        }
        info!(pipeline = %self.pipeline, processor = %self.alias, "drop processor stopped");
    }
}
