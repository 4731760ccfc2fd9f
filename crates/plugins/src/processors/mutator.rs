//! Mutator processor - declarative event edits
//!
//! Applies configured edits to every event passing through: payload
//! fields via dotted paths, labels, tags and the routing key. Path
//! failures are stacked on the event; the event always proceeds.
//!
//! # Configuration
//!
//! ```toml
//! [processors.mutator]
//! routing_key = "normalized"
//! delete_fields = ["raw.trace"]
//! add_tags = ["mutated"]
//!
//! [processors.mutator.set_fields]
//! "meta.source" = "neptunus"
//! "meta.version" = 3
//!
//! [processors.mutator.set_labels]
//! stage = "enrich"
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use neptunus_core::decode::decode;
use neptunus_core::{Event, EventRx, EventTx, Payload, PluginError, Processor};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct MutatorConfig {
    set_fields: BTreeMap<String, toml::Value>,
    delete_fields: Vec<String>,
    set_labels: BTreeMap<String, String>,
    delete_labels: Vec<String>,
    add_tags: Vec<String>,
    delete_tags: Vec<String>,
    routing_key: Option<String>,
}

/// Applies configured field, label and tag edits to each event
#[derive(Default)]
pub struct Mutator {
    alias: String,
    pipeline: String,
    id: u64,
    config: MutatorConfig,
    input: Option<EventRx>,
    out: Option<EventTx>,
}

impl Mutator {
    fn apply(&self, event: &mut Event) {
        for key in &self.config.delete_fields {
            // deleting an already absent node is not an error
            let _ = event.delete_field(key);
        }
        for (key, value) in &self.config.set_fields {
            if let Err(err) = event.set_field(key, Payload::from(value)) {
                warn!(
                    pipeline = %self.pipeline,
                    processor = %self.alias,
                    field = %key,
                    error = %err,
                    "field write failed"
                );
                event.stack_error(format!("mutator: set of '{key}' failed: {err}"));
            }
        }

        for key in &self.config.delete_labels {
            event.delete_label(key);
        }
        for (key, value) in &self.config.set_labels {
            event.add_label(key.clone(), value.clone());
        }

        for tag in &self.config.delete_tags {
            event.delete_tag(tag);
        }
        for tag in &self.config.add_tags {
            event.add_tag(tag.clone());
        }

        if let Some(routing_key) = &self.config.routing_key {
            event.set_routing_key(routing_key.clone());
        }
    }
}

#[async_trait]
impl Processor for Mutator {
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

    fn set_channels(&mut self, input: EventRx, out: EventTx) {
        self.input = Some(input);
        self.out = Some(out);
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    async fn run(&mut self) {
        let (Some(input), Some(out)) = (self.input.take(), self.out.take()) else {
            return;
        };
        while let Ok(mut event) = input.recv().await {
            self.apply(&mut event);
            debug!(
                pipeline = %self.pipeline,
                processor = %self.alias,
                id = %event.id(),
                "event mutated"
            );
            if out.send(event).await.is_err() {
                break;
            }
        }
        info!(
            pipeline = %self.pipeline,
            processor = %self.alias,
            plugin_id = self.id,
            "mutator stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neptunus_core::event_channel;
    use serde_json::json;

    fn table(raw: &str) -> toml::Table {
        toml::from_str(raw).expect("valid toml")
    }

    async fn run_one(config: &str, event: Event) -> Event {
        let mut processor = Mutator::default();
        processor.init(&table(config), "mutator-0", "test").unwrap();

        let (in_tx, in_rx) = event_channel(10);
        let (out_tx, out_rx) = event_channel(10);
        processor.set_channels(in_rx, out_tx);

        in_tx.send(event).await.unwrap();
        drop(in_tx);
        processor.run().await;

        out_rx.recv().await.unwrap()
    }

    #[tokio::test]
    async fn test_set_and_delete_fields() {
        let event = Event::with_data("logs", Payload::from(json!({"raw": {"trace": "x"}, "n": 1})));
        let got = run_one(
            r#"
            delete_fields = ["raw.trace"]
            [set_fields]
            "meta.source" = "neptunus"
            "#,
            event,
        )
        .await;

        assert_eq!(
            got.get_field("meta.source").unwrap(),
            &Payload::from("neptunus")
        );
        assert!(got.get_field("raw.trace").is_err());
        assert_eq!(got.get_field("n").unwrap(), &Payload::Int(1));
        got.done();
    }

    #[tokio::test]
    async fn test_invalid_path_stacks_error_and_proceeds() {
        let event = Event::with_data("logs", Payload::from(json!({"seq": [1, 2]})));
        let got = run_one(
            r#"
            [set_fields]
            "seq.key" = 1
            "#,
            event,
        )
        .await;

        assert!(got.has_errors());
        assert_eq!(got.data(), &Payload::from(json!({"seq": [1, 2]})));
        got.done();
    }

    #[tokio::test]
    async fn test_labels_tags_and_routing_key() {
        let mut event = Event::new("logs");
        event.add_label("old", "1");
        event.add_tag("stale");

        let got = run_one(
            r#"
            routing_key = "normalized"
            delete_labels = ["old"]
            add_tags = ["mutated"]
            delete_tags = ["stale"]
            [set_labels]
            stage = "enrich"
            "#,
            event,
        )
        .await;

        assert_eq!(got.routing_key(), "normalized");
        assert_eq!(got.get_label("stage"), Some("enrich"));
        assert_eq!(got.get_label("old"), None);
        assert!(got.has_tag("mutated"));
        assert!(!got.has_tag("stale"));
        got.done();
    }
}
