//! JSON parser - raw bytes to events
//!
//! An object becomes one event; an array becomes one event per element.
//! Any other top-level value becomes a single event carrying it as the
//! whole payload.

use neptunus_core::{Event, Parser, Payload, PluginError};

/// Parses JSON documents into events
#[derive(Default)]
pub struct Json {
    alias: String,
    pipeline: String,
}

impl Parser for Json {
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

    fn parse(&self, data: &[u8], routing_key: &str) -> Result<Vec<Event>, PluginError> {
        let value: serde_json::Value = serde_json::from_slice(data).map_err(|err| {
            PluginError::runtime(format!(
                "{}/{}: json parse failed: {err}",
                self.pipeline, self.alias
            ))
        })?;

        let events = match value {
            serde_json::Value::Array(elements) => elements
                .into_iter()
                .map(|element| Event::with_data(routing_key, Payload::from(element)))
                .collect(),
            other => vec![Event::with_data(routing_key, Payload::from(other))],
        };
        Ok(events)
    }
}
