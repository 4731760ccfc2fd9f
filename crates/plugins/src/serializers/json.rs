//! JSON serializer - events to bytes
//!
//! A single event renders as an object, several as an array.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | `pretty` | bool | `false` | Indented output |
//! | `data_only` | bool | `false` | Render just the payload, not the envelope |

use serde::Deserialize;

use neptunus_core::decode::decode;
use neptunus_core::{Event, PluginError, Serializer};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct JsonConfig {
    pretty: bool,
    data_only: bool,
}

/// Renders events as JSON
#[derive(Default)]
pub struct Json {
    alias: String,
    pipeline: String,
    config: JsonConfig,
}

impl Json {
    fn render(&self, value: &serde_json::Value) -> Result<Vec<u8>, PluginError> {
        let result = if self.config.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        result.map_err(|err| {
            PluginError::runtime(format!(
                "{}/{}: json serialization failed: {err}",
                self.pipeline, self.alias
            ))
        })
    }

    fn event_value(&self, event: &Event) -> Result<serde_json::Value, PluginError> {
        if self.config.data_only {
            return Ok(serde_json::Value::from(event.data()));
        }
        serde_json::to_value(event)
            .map_err(|err| PluginError::runtime(format!("json serialization failed: {err}")))
    }
}

impl Serializer for Json {
    fn init(
        &mut self,
        conf: &toml::Table,
        alias: &str,
        pipeline: &str,
    ) -> Result<(), PluginError> {
        self.config = decode(conf)?;
        self.alias = alias.to_owned();
        self.pipeline = pipeline.to_owned();
        Ok(())
    }

    fn serialize(&self, events: &[Event]) -> Result<Vec<u8>, PluginError> {
        match events {
            [single] => {
                let value = self.event_value(single)?;
                self.render(&value)
            }
            many => {
                let values = many
                    .iter()
                    .map(|event| self.event_value(event))
                    .collect::<Result<Vec<_>, _>>()?;
                self.render(&serde_json::Value::Array(values))
            }
        }
    }
}
