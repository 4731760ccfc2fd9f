//! Plugin capability contracts
//!
//! Every plugin kind exposes a small capability set: configuration via
//! [`decode`](crate::decode::decode)-friendly tables, channel wiring,
//! a run loop and a close hook. The pipeline wraps each plugin in a
//! soft-unit that adapts it to channel dataflow; plugins themselves
//! never see filters or the topology.
//!
//! # Termination discipline
//!
//! Inputs are the only plugins that receive a stop signal; they stop
//! producing and drop their out sender when the token fires. Every
//! other kind terminates when its in-channel closes, and closure
//! propagates through the graph from there. Out-channels are always
//! closed by the producer side.

use async_trait::async_trait;

use crate::error::PluginError;
use crate::event::Event;

pub use tokio_util::sync::CancellationToken;

/// Sending half of an event channel; cloneable for fan-in
pub type EventTx = crossfire::MAsyncTx<Event>;

/// Receiving half of an event channel; cloneable for fan-out to
/// parallel processor lines
pub type EventRx = crossfire::MAsyncRx<Event>;

/// Create a bounded event channel
///
/// Senders block when the channel is full; backpressure propagates
/// upstream through the whole graph. The channel closes when every
/// sender is dropped.
pub fn event_channel(buffer: usize) -> (EventTx, EventRx) {
    crossfire::mpmc::bounded_async(buffer)
}

/// Input plugins consume events from the outer world
#[async_trait]
pub trait Input: Send {
    /// Apply configuration; called once before any channel wiring
    fn init(&mut self, conf: &toml::Table, alias: &str, pipeline: &str)
        -> Result<(), PluginError>;

    /// Receive the stop signal and the out-channel
    fn set_channels(&mut self, stop: CancellationToken, out: EventTx);

    /// Produce events until the stop token fires
    async fn run(&mut self);

    /// Release resources after the run loop returns
    async fn close(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Attach a parser sub-plugin
    ///
    /// Inputs that consume raw bytes override this; the default refusal
    /// turns a configured `parser` section into a build error.
    fn set_parser(&mut self, _parser: Box<dyn Parser>) -> Result<(), PluginError> {
        Err(PluginError::Capability("parser"))
    }
}

/// Processor plugins transform events
#[async_trait]
pub trait Processor: Send {
    fn init(&mut self, conf: &toml::Table, alias: &str, pipeline: &str)
        -> Result<(), PluginError>;

    fn set_channels(&mut self, input: EventRx, out: EventTx);

    /// Consume from the in-channel until it closes
    async fn run(&mut self);

    async fn close(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Receive the plugin id, shared by this processor's instances
    /// across all parallel lines
    fn set_id(&mut self, _id: u64) {}
}

/// Filter plugins sort events into accepted and rejected streams
#[async_trait]
pub trait Filter: Send {
    fn init(&mut self, conf: &toml::Table, alias: &str, pipeline: &str)
        -> Result<(), PluginError>;

    fn set_channels(&mut self, input: EventRx, rejected: EventTx, accepted: EventTx);

    async fn run(&mut self);

    async fn close(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Output plugins produce events to the outer world
///
/// Outputs call [`Event::done`] after each event is delivered or has
/// permanently failed.
#[async_trait]
pub trait Output: Send {
    fn init(&mut self, conf: &toml::Table, alias: &str, pipeline: &str)
        -> Result<(), PluginError>;

    fn set_channels(&mut self, input: EventRx);

    async fn run(&mut self);

    async fn close(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Attach a serializer sub-plugin
    fn set_serializer(&mut self, _serializer: Box<dyn Serializer>) -> Result<(), PluginError> {
        Err(PluginError::Capability("serializer"))
    }
}

/// Parser plugins turn raw bytes into events
///
/// Shared by every connection task of the owning input, hence `Sync`.
pub trait Parser: Send + Sync {
    fn init(&mut self, conf: &toml::Table, alias: &str, pipeline: &str)
        -> Result<(), PluginError>;

    /// Parse one unit of raw data into zero or more events
    fn parse(&self, data: &[u8], routing_key: &str) -> Result<Vec<Event>, PluginError>;

    fn close(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Serializer plugins render events into a configured wire format
pub trait Serializer: Send + Sync {
    fn init(&mut self, conf: &toml::Table, alias: &str, pipeline: &str)
        -> Result<(), PluginError>;

    fn serialize(&self, events: &[Event]) -> Result<Vec<u8>, PluginError>;

    fn close(&self) -> Result<(), PluginError> {
        Ok(())
    }
}
