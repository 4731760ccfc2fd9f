//! In-crate test plugins
//!
//! Deterministic inputs/outputs for exercising units and whole
//! topologies without timers or sockets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use neptunus_core::{
    CancellationToken, Event, EventRx, EventTx, Filter, Input, Output, Payload, PluginError,
    Processor,
};

/// What an output observed, after the event itself is completed
#[derive(Debug, Clone)]
pub struct Seen {
    pub routing_key: String,
    pub data: Payload,
    pub tags: Vec<String>,
}

pub type SeenLog = Arc<Mutex<Vec<Seen>>>;

/// Emits a fixed batch of events, attaching a shared completion counter
/// to each, then returns without waiting for the stop signal
pub struct EmitInput {
    pub events: Vec<Event>,
    pub hooks_fired: Arc<AtomicUsize>,
    out: Option<EventTx>,
}

impl EmitInput {
    pub fn new(events: Vec<Event>, hooks_fired: Arc<AtomicUsize>) -> Self {
        Self {
            events,
            hooks_fired,
            out: None,
        }
    }

    /// `count` events with the given routing key and a `seq` field
    pub fn counted(routing_key: &str, count: usize, hooks_fired: Arc<AtomicUsize>) -> Self {
        let events = (0..count)
            .map(|seq| {
                let mut event = Event::new(routing_key);
                event.set_field("seq", seq as u64).expect("fresh payload");
                event
            })
            .collect();
        Self::new(events, hooks_fired)
    }
}

#[async_trait]
impl Input for EmitInput {
    fn init(&mut self, _conf: &toml::Table, _alias: &str, _pipeline: &str) -> Result<(), PluginError> {
        Ok(())
    }

    fn set_channels(&mut self, _stop: CancellationToken, out: EventTx) {
        self.out = Some(out);
    }

    async fn run(&mut self) {
        let Some(out) = self.out.take() else { return };
        for event in self.events.drain(..) {
            let fired = Arc::clone(&self.hooks_fired);
            event.add_hook(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            });
            if out.send(event).await.is_err() {
                return;
            }
        }
    }
}

/// Records every event it consumes, then completes it
pub struct CollectOutput {
    pub log: SeenLog,
    input: Option<EventRx>,
}

impl CollectOutput {
    pub fn new(log: SeenLog) -> Self {
        Self { log, input: None }
    }
}

#[async_trait]
impl Output for CollectOutput {
    fn init(&mut self, _conf: &toml::Table, _alias: &str, _pipeline: &str) -> Result<(), PluginError> {
        Ok(())
    }

    fn set_channels(&mut self, input: EventRx) {
        self.input = Some(input);
    }

    async fn run(&mut self) {
        let Some(input) = self.input.take() else { return };
        while let Ok(event) = input.recv().await {
            self.log.lock().push(Seen {
                routing_key: event.routing_key().to_owned(),
                data: event.data().clone(),
                tags: event.tags().to_vec(),
            });
            event.done();
        }
    }
}

/// Tags every event with the alias it was configured with
#[derive(Default)]
pub struct TagProcessor {
    alias: String,
    input: Option<EventRx>,
    out: Option<EventTx>,
}

#[async_trait]
impl Processor for TagProcessor {
    fn init(&mut self, _conf: &toml::Table, alias: &str, _pipeline: &str) -> Result<(), PluginError> {
        self.alias = alias.to_owned();
        Ok(())
    }

    fn set_channels(&mut self, input: EventRx, out: EventTx) {
        self.input = Some(input);
        self.out = Some(out);
    }

    async fn run(&mut self) {
        let (Some(input), Some(out)) = (self.input.take(), self.out.take()) else {
            return;
        };
        while let Ok(mut event) = input.recv().await {
            event.add_tag(self.alias.clone());
            if out.send(event).await.is_err() {
                break;
            }
        }
    }
}

/// Accepts events whose routing key equals the configured `key`
#[derive(Default)]
pub struct KeyFilter {
    key: String,
    input: Option<EventRx>,
    rejected: Option<EventTx>,
    accepted: Option<EventTx>,
}

#[async_trait]
impl Filter for KeyFilter {
    fn init(&mut self, conf: &toml::Table, _alias: &str, _pipeline: &str) -> Result<(), PluginError> {
        self.key = conf
            .get("key")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PluginError::config("key required"))?
            .to_owned();
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
            let sink = if event.routing_key() == self.key {
                &accepted
            } else {
                &rejected
            };
            if sink.send(event).await.is_err() {
                break;
            }
        }
    }
}
