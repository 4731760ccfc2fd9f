//! Core error types
//!
//! Errors shared by the event model, the path engine and the plugin
//! contracts.

use thiserror::Error;

/// Errors returned by the payload path engine
///
/// Path operations never mutate the payload on error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    /// A segment missed: unknown key, out-of-range index, or descending
    /// into a primitive node
    #[error("no such field")]
    NoSuchField,

    /// The path cannot address a node in this payload: non-integer
    /// segment against a sequence, or descending through a primitive
    /// on write
    #[error("invalid path")]
    InvalidPath,
}

/// Errors returned by payload conversion helpers
///
/// Overflow is reported separately from a plain type mismatch so callers
/// can distinguish "wrong kind of value" from "right kind, out of range".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The payload kind cannot be converted to the requested type
    #[error("cannot convert {from} to {to}")]
    Mismatch {
        /// Source payload kind
        from: &'static str,
        /// Requested type
        to: &'static str,
    },

    /// The value is the right kind but out of range for the target type
    #[error("{value} overflows {to}")]
    Overflow {
        /// Display form of the offending value
        value: String,
        /// Requested type
        to: &'static str,
    },
}

impl ConvertError {
    pub(crate) fn mismatch(from: &'static str, to: &'static str) -> Self {
        Self::Mismatch { from, to }
    }

    pub(crate) fn overflow(value: impl ToString, to: &'static str) -> Self {
        Self::Overflow {
            value: value.to_string(),
            to,
        }
    }
}

/// Failure to decode a plugin configuration table into its config struct
#[derive(Debug, Error)]
#[error("configuration decode failed: {0}")]
pub struct DecodeError(#[from] pub toml::de::Error);

/// Errors raised by plugins
#[derive(Debug, Error)]
pub enum PluginError {
    /// Invalid plugin configuration, detected at init time
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration table does not match the plugin's config struct
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The plugin does not implement an optional capability
    #[error("capability not supported: {0}")]
    Capability(&'static str),

    /// Runtime failure; stacked on the event, never fatal for the pipeline
    #[error("{0}")]
    Runtime(String),

    /// I/O failure inside a plugin
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PluginError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a runtime error
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }
}
