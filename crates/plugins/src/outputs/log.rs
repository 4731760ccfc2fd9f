//! Log output - emits events through the process log
//!
//! Serializes each event with the attached serializer (JSON when none
//! is configured) and writes it at the configured level. Debugging aid,
//! not a production sink.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | `level` | string | `"info"` | One of `trace`, `debug`, `info`, `warn` |

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, trace, warn};

use neptunus_core::decode::decode;
use neptunus_core::{EventRx, Output, PluginError, Serializer};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct LogConfig {
    level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

/// Writes serialized events to the process log
#[derive(Default)]
pub struct Log {
    alias: String,
    pipeline: String,
    config: LogConfig,
    serializer: Option<Box<dyn Serializer>>,
    input: Option<EventRx>,
}

#[async_trait]
impl Output for Log {
    fn init(
        &mut self,
        conf: &toml::Table,
        alias: &str,
        pipeline: &str,
    ) -> Result<(), PluginError> {
        self.config = decode(conf)?;
        self.alias = alias.to_owned();
        self.pipeline = pipeline.to_owned();

        match self.config.level.as_str() {
            "trace" | "debug" | "info" | "warn" => Ok(()),
            other => Err(PluginError::config(format!(
                "forbidden logging level: {other}; expected one of: trace, debug, info, warn"
            ))),
        }
    }

    fn set_channels(&mut self, input: EventRx) {
        self.input = Some(input);
    }

    fn set_serializer(&mut self, serializer: Box<dyn Serializer>) -> Result<(), PluginError> {
        self.serializer = Some(serializer);
        Ok(())
    }

    async fn run(&mut self) {
        let Some(input) = self.input.take() else {
            return;
        };
        while let Ok(event) = input.recv().await {
            let rendered = match &self.serializer {
                Some(serializer) => serializer.serialize(std::slice::from_ref(&event)),
                None => serde_json::to_vec(&event).map_err(|e| PluginError::runtime(e.to_string())),
            };
            match rendered {
                Ok(bytes) => {
                    let line = String::from_utf8_lossy(&bytes);
                    match self.config.level.as_str() {
                        "trace" => trace!(pipeline = %self.pipeline, output = %self.alias, "{line}"),
                        "debug" => debug!(pipeline = %self.pipeline, output = %self.alias, "{line}"),
                        "warn" => warn!(pipeline = %self.pipeline, output = %self.alias, "{line}"),
                        _ => info!(pipeline = %self.pipeline, output = %self.alias, "{line}"),
                    }
                }
                Err(err) => {
                    warn!(
                        pipeline = %self.pipeline,
                        output = %self.alias,
                        error = %err,
                        "event serialization failed"
                    );
                }
            }
            event.done();
        }
        info!(pipeline = %self.pipeline, output = %self.alias, "log output stopped");
    }

    async fn close(&mut self) -> Result<(), PluginError> {
        if let Some(serializer) = &self.serializer {
            serializer.close()?;
        }
        Ok(())
    }
}
