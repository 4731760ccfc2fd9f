//! Event - the unit of data flowing through a pipeline
//!
//! An event carries identity, routing, labels, tags, a payload and an
//! error stack, plus a completion tracker shared by every clone derived
//! from the same ingestion.
//!
//! # Completion tracking
//!
//! Every event starts with a duty of 1. Cloning bumps the shared
//! counter; [`Event::done`] decrements it. When the counter returns to
//! zero the hooks attached at ingestion fire exactly once, in
//! registration order. This lets an input learn when every descendant
//! of an emitted event has been fully processed, wherever in the graph
//! those descendants ended up.
//!
//! # Ownership
//!
//! An event is owned by one stage at a time; ownership passes by
//! channel send. Clones are the only way to hold multiple live
//! references, and each clone is independently owned. `done` consumes
//! the event, so "no use after done" holds by construction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use uuid::Uuid;

use crate::error::PathError;
use crate::path;
use crate::payload::Payload;

/// Completion callback attached at ingestion time
pub type Hook = Box<dyn FnOnce() + Send>;

/// Duty counter and hook list shared by all clones of an ingestion
///
/// The only mutations after ingestion are `done` (decrement) and
/// `clone` (increment), so the hook list stays effectively frozen once
/// the event is in flight.
struct Tracker {
    duty: AtomicI64,
    hooks: Mutex<Vec<Hook>>,
    completed: AtomicBool,
}

impl Tracker {
    fn new() -> Self {
        Self {
            duty: AtomicI64::new(1),
            hooks: Mutex::new(Vec::new()),
            completed: AtomicBool::new(false),
        }
    }

    fn begin_descendant(&self) {
        let previous = self.duty.fetch_add(1, Ordering::AcqRel);
        if previous <= 0 || self.completed.load(Ordering::Acquire) {
            tracing::error!("event cloned after its hooks already fired");
        }
    }

    fn complete_one(&self) {
        let left = self.duty.fetch_sub(1, Ordering::AcqRel) - 1;
        match left.cmp(&0) {
            std::cmp::Ordering::Greater => {}
            std::cmp::Ordering::Equal => {
                self.completed.store(true, Ordering::Release);
                let hooks = std::mem::take(&mut *self.hooks.lock());
                for hook in hooks {
                    hook();
                }
            }
            std::cmp::Ordering::Less => {
                tracing::error!("event done called again after its hooks already fired");
            }
        }
    }

    fn add_hook(&self, hook: Hook) {
        if self.completed.load(Ordering::Acquire) {
            tracing::error!("hook attached after event hooks already fired, dropping it");
            return;
        }
        self.hooks.lock().push(hook);
    }
}

/// The unit of data flowing through the pipeline
pub struct Event {
    id: String,
    routing_key: String,
    timestamp: DateTime<Utc>,
    labels: HashMap<String, String>,
    tags: Vec<String>,
    errors: Vec<String>,
    data: Payload,
    tracker: Arc<Tracker>,
}

impl Event {
    /// Create an event with a fresh id, a now-timestamp and a duty of 1
    pub fn new(routing_key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            routing_key: routing_key.into(),
            timestamp: Utc::now(),
            labels: HashMap::new(),
            tags: Vec::new(),
            errors: Vec::new(),
            data: Payload::Null,
            tracker: Arc::new(Tracker::new()),
        }
    }

    /// Create an event carrying the given payload
    pub fn with_data(routing_key: impl Into<String>, data: Payload) -> Self {
        let mut event = Self::new(routing_key);
        event.data = data;
        event
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    pub fn set_routing_key(&mut self, routing_key: impl Into<String>) {
        self.routing_key = routing_key.into();
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
    }

    pub fn data(&self) -> &Payload {
        &self.data
    }

    /// Replace the whole payload
    pub fn set_data(&mut self, data: Payload) {
        self.data = data;
    }

    /// Resolve a dotted path against the payload
    pub fn get_field(&self, key: &str) -> Result<&Payload, PathError> {
        path::find_in_payload(&self.data, key)
    }

    /// Write a value at a dotted path; the payload is untouched on error
    pub fn set_field(&mut self, key: &str, value: impl Into<Payload>) -> Result<(), PathError> {
        let data = std::mem::take(&mut self.data);
        match path::try_put(data, key, value.into()) {
            Ok(data) => {
                self.data = data;
                Ok(())
            }
            Err((data, err)) => {
                self.data = data;
                Err(err)
            }
        }
    }

    /// Remove the node at a dotted path; the payload is untouched on error
    pub fn delete_field(&mut self, key: &str) -> Result<(), PathError> {
        let data = std::mem::take(&mut self.data);
        match path::try_delete(data, key) {
            Ok(data) => {
                self.data = data;
                Ok(())
            }
            Err((data, err)) => {
                self.data = data;
                Err(err)
            }
        }
    }

    pub fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }

    pub fn add_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.labels.insert(key.into(), value.into());
    }

    pub fn get_label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn delete_label(&mut self, key: &str) -> bool {
        self.labels.remove(key).is_some()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Add a tag; duplicates are ignored
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn delete_tag(&mut self, tag: &str) -> bool {
        match self.tags.iter().position(|t| t == tag) {
            Some(index) => {
                self.tags.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Record a processing error on the event; never fails
    pub fn stack_error(&mut self, err: impl std::fmt::Display) {
        self.errors.push(err.to_string());
    }

    /// Clear the error stack; only explicit plugin action does this
    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Attach a completion hook
    ///
    /// Hooks run exactly once, in registration order, when the duty of
    /// this ingestion returns to zero. Attaching a hook after the hooks
    /// already fired is reported and ignored; inputs attach hooks before
    /// the first send.
    pub fn add_hook(&self, hook: impl FnOnce() + Send + 'static) {
        self.tracker.add_hook(Box::new(hook));
    }

    /// Mark this reference as fully processed
    ///
    /// Decrements the shared duty counter; the call that brings it to
    /// zero runs the hooks. Consumes the event.
    pub fn done(self) {
        self.tracker.complete_one();
    }

    /// Outstanding descendants of this ingestion, for diagnostics
    pub fn duty(&self) -> i64 {
        self.tracker.duty.load(Ordering::Acquire)
    }
}

impl Clone for Event {
    /// Deep-copy the event and register it as another outstanding
    /// descendant of the same ingestion
    ///
    /// Labels, tags, errors and data are copied; the hook list and duty
    /// counter are shared, so hooks fire once the last copy is done.
    fn clone(&self) -> Self {
        self.tracker.begin_descendant();
        Self {
            id: self.id.clone(),
            routing_key: self.routing_key.clone(),
            timestamp: self.timestamp,
            labels: self.labels.clone(),
            tags: self.tags.clone(),
            errors: self.errors.clone(),
            data: self.data.clone(),
            tracker: Arc::clone(&self.tracker),
        }
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("routing_key", &self.routing_key)
            .field("timestamp", &self.timestamp)
            .field("tags", &self.tags)
            .field("errors", &self.errors)
            .field("duty", &self.duty())
            .finish_non_exhaustive()
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Event", 7)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("routing_key", &self.routing_key)?;
        state.serialize_field(
            "timestamp",
            &self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )?;
        state.serialize_field("labels", &self.labels)?;
        state.serialize_field("tags", &self.tags)?;
        state.serialize_field("errors", &self.errors)?;
        state.serialize_field("data", &self.data)?;
        state.end()
    }
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
