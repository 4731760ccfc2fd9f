//! Neptunus - Core
//!
//! The event model and plugin contracts of the Neptunus
//! event-processing engine.
//!
//! # Overview
//!
//! - [`Event`] - the unit of data in flight: identity, routing key,
//!   labels, tags, error stack, payload and a completion tracker
//! - [`Payload`] - runtime-typed nested data, addressed with dotted
//!   paths through the [`path`] engine
//! - [`plugin`] - capability traits for the six plugin kinds plus the
//!   parser/serializer/id side-capabilities
//! - [`decode`] - tolerant configuration decoding for plugin config
//!   structs
//!
//! # Dataflow
//!
//! ```text
//! [Inputs] ──→ fusion ──→ [processor lines ×N] ──→ fusion ──→ broadcast ──→ [Outputs]
//! ```
//!
//! Events move by channel handoff; each stage owns an event until it
//! sends it on. Cloning is the only way to hold multiple live
//! references, and every clone registers itself with the shared
//! completion tracker so ingestion hooks fire exactly once.

mod error;
mod event;
mod payload;

pub mod decode;
pub mod path;
pub mod plugin;

pub use error::{ConvertError, DecodeError, PathError, PluginError};
pub use event::{Event, Hook};
pub use path::{delete_from_payload, find_in_payload, put_in_payload};
pub use payload::Payload;
pub use plugin::{
    event_channel, CancellationToken, EventRx, EventTx, Filter, Input, Output, Parser, Processor,
    Serializer,
};
