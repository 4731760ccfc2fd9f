//! NoErrors filter - rejects events with a non-empty error stack

use async_trait::async_trait;
use tracing::info;

use neptunus_core::{EventRx, EventTx, Filter, PluginError};

/// Accepts events whose error stack is empty
#[derive(Default)]
pub struct NoErrors {
    alias: String,
    pipeline: String,
    input: Option<EventRx>,
    rejected: Option<EventTx>,
    accepted: Option<EventTx>,
}

#[async_trait]
impl Filter for NoErrors {
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

    fn set_channels(&mut self, input: EventRx, rejected: EventTx, accepted: EventTx) {
        self.input = Some(input);
        self.rejected = Some(rejected);
        self.accepted = Some(accepted);
    }

    async fn run(&mut self) {
        let (Some(input), Some(rejected), Some(accepted)) =
            (self.input.take(), self.rejected.take(), self.accepted.take())
        else {
            return;
        };
        while let Ok(event) = input.recv().await {
            let sink = if event.has_errors() { &rejected } else { &accepted };
            if sink.send(event).await.is_err() {
                break;
            }
        }
        info!(pipeline = %self.pipeline, filter = %self.alias, "noerrors filter stopped");
    }
}
