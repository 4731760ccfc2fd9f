//! Glob filter - wildcard matching on routing keys, labels and fields
//!
//! Accepts an event when its routing key matches any of the configured
//! patterns and every configured label and field matches at least one
//! of its patterns. Groups that are not configured always pass, so an
//! empty configuration accepts everything.
//!
//! Patterns are shell-style globs where `*` matches any run of
//! characters:
//!
//! ```toml
//! [inputs.schedule.filters.glob]
//! routing_key = ["pass-me", "passed-*-key"]
//!
//! [inputs.schedule.filters.glob.labels]
//! test = ["t*e"]
//!
//! [inputs.schedule.filters.glob.fields]
//! "one.two" = ["t*ee"]
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::info;

use neptunus_core::decode::decode;
use neptunus_core::{Event, EventRx, EventTx, Filter, Payload, PluginError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GlobConfig {
    routing_key: Vec<String>,
    labels: BTreeMap<String, Vec<String>>,
    fields: BTreeMap<String, Vec<String>>,
}

/// Wildcard routing-key, label and field matcher
#[derive(Default)]
pub struct Glob {
    alias: String,
    pipeline: String,
    routing_key: Vec<Regex>,
    labels: Vec<(String, Vec<Regex>)>,
    fields: Vec<(String, Vec<Regex>)>,
    input: Option<EventRx>,
    rejected: Option<EventTx>,
    accepted: Option<EventTx>,
}

/// Compile a `*`-wildcard pattern into an anchored regex
fn glob_to_regex(pattern: &str) -> Result<Regex, PluginError> {
    let mut expression = String::with_capacity(pattern.len() + 8);
    expression.push('^');
    for (index, part) in pattern.split('*').enumerate() {
        if index > 0 {
            expression.push_str(".*");
        }
        expression.push_str(&regex::escape(part));
    }
    expression.push('$');
    Regex::new(&expression)
        .map_err(|err| PluginError::config(format!("bad pattern '{pattern}': {err}")))
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, PluginError> {
    patterns.iter().map(|p| glob_to_regex(p)).collect()
}

fn matches_any(patterns: &[Regex], value: &str) -> bool {
    patterns.iter().any(|p| p.is_match(value))
}

impl Glob {
    fn accepts(&self, event: &Event) -> bool {
        if !self.routing_key.is_empty() && !matches_any(&self.routing_key, event.routing_key()) {
            return false;
        }
        for (key, patterns) in &self.labels {
            let Some(value) = event.get_label(key) else {
                return false;
            };
            if !matches_any(patterns, value) {
                return false;
            }
        }
        for (key, patterns) in &self.fields {
            let Ok(Payload::String(value)) = event.get_field(key) else {
                return false;
            };
            if !matches_any(patterns, value) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl Filter for Glob {
    fn init(
        &mut self,
        conf: &toml::Table,
        alias: &str,
        pipeline: &str,
    ) -> Result<(), PluginError> {
        let config: GlobConfig = decode(conf)?;
        self.alias = alias.to_owned();
        self.pipeline = pipeline.to_owned();

        self.routing_key = compile(&config.routing_key)?;
        self.labels = config
            .labels
            .iter()
            .map(|(key, patterns)| Ok((key.clone(), compile(patterns)?)))
            .collect::<Result<_, PluginError>>()?;
        self.fields = config
            .fields
            .iter()
            .map(|(key, patterns)| Ok((key.clone(), compile(patterns)?)))
            .collect::<Result<_, PluginError>>()?;
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
            let sink = if self.accepts(&event) { &accepted } else { &rejected };
            if sink.send(event).await.is_err() {
                break;
            }
        }
        info!(pipeline = %self.pipeline, filter = %self.alias, "glob filter stopped");
    }
}
