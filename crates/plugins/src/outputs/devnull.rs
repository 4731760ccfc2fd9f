//! Devnull output - accepts and discards everything
//!
//! Completes each event without delivering it anywhere. The terminal
//! stage for benchmarking and for pipelines whose work happens in
//! processors.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::info;

use neptunus_core::{EventRx, Output, PluginError};

/// Discards every event it receives
#[derive(Default)]
pub struct Devnull {
    alias: String,
    pipeline: String,
    consumed: AtomicU64,
    input: Option<EventRx>,
}

#[async_trait]
impl Output for Devnull {
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

    fn set_channels(&mut self, input: EventRx) {
        self.input = Some(input);
    }

    async fn run(&mut self) {
        let Some(input) = self.input.take() else {
            return;
        };
        while let Ok(event) = input.recv().await {
            self.consumed.fetch_add(1, Ordering::Relaxed);
            event.done();
        }
        info!(
            pipeline = %self.pipeline,
            output = %self.alias,
            consumed = self.consumed.load(Ordering::Relaxed),
            "devnull output stopped"
        );
    }
}
