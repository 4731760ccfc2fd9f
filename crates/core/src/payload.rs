//! Payload - the nested data attached to an event
//!
//! A payload is a recursively tagged value: a mapping, a sequence, or a
//! primitive. Processors address nodes inside it with dotted paths (see
//! [`crate::path`]).
//!
//! # Design
//!
//! - **Runtime-typed**: plugins receive arbitrary shapes from the outer
//!   world; the tagged union keeps them navigable without a schema
//! - **Checked conversions**: `to_*` helpers perform explicit
//!   widening/narrowing; overflow is reported separately from a type
//!   mismatch
//! - **JSON bridge**: lossless-enough conversion to and from
//!   `serde_json::Value` for parser/serializer plugins

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::error::ConvertError;

/// A single node of event data
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// The null value
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    /// A wall-clock instant
    Time(DateTime<Utc>),
    /// A span of time
    Duration(Duration),
    /// Raw bytes, kept out of the string space on purpose
    Bytes(Vec<u8>),
    /// Ordered sequence of nodes
    Sequence(Vec<Payload>),
    /// String-keyed mapping; key order is not significant
    Mapping(HashMap<String, Payload>),
}

impl Payload {
    /// Kind name for diagnostics and conversion errors
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Null => "null",
            Payload::Bool(_) => "bool",
            Payload::Int(_) => "int",
            Payload::Uint(_) => "uint",
            Payload::Float(_) => "float",
            Payload::String(_) => "string",
            Payload::Time(_) => "time",
            Payload::Duration(_) => "duration",
            Payload::Bytes(_) => "bytes",
            Payload::Sequence(_) => "sequence",
            Payload::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Null)
    }

    /// Borrow the string value, or fail with a mismatch
    pub fn as_str(&self) -> Result<&str, ConvertError> {
        match self {
            Payload::String(s) => Ok(s),
            other => Err(ConvertError::mismatch(other.kind(), "string")),
        }
    }

    /// Convert to a signed integer with range checks
    ///
    /// Floats are truncated; strings are parsed as base-10.
    pub fn to_i64(&self) -> Result<i64, ConvertError> {
        match self {
            Payload::Int(i) => Ok(*i),
            Payload::Uint(u) => {
                i64::try_from(*u).map_err(|_| ConvertError::overflow(*u, "i64"))
            }
            Payload::Float(f) => {
                if *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Ok(*f as i64)
                } else {
                    Err(ConvertError::overflow(*f, "i64"))
                }
            }
            Payload::String(s) => s
                .parse()
                .map_err(|_| ConvertError::mismatch("string", "i64")),
            other => Err(ConvertError::mismatch(other.kind(), "i64")),
        }
    }

    /// Convert to an unsigned integer with range checks
    pub fn to_u64(&self) -> Result<u64, ConvertError> {
        match self {
            Payload::Int(i) => {
                u64::try_from(*i).map_err(|_| ConvertError::overflow(*i, "u64"))
            }
            Payload::Uint(u) => Ok(*u),
            Payload::Float(f) => {
                if *f >= 0.0 && *f <= u64::MAX as f64 {
                    Ok(*f as u64)
                } else {
                    Err(ConvertError::overflow(*f, "u64"))
                }
            }
            Payload::String(s) => s
                .parse()
                .map_err(|_| ConvertError::mismatch("string", "u64")),
            other => Err(ConvertError::mismatch(other.kind(), "u64")),
        }
    }

    /// Convert to a float; integers widen, strings are parsed
    pub fn to_f64(&self) -> Result<f64, ConvertError> {
        match self {
            Payload::Int(i) => Ok(*i as f64),
            Payload::Uint(u) => Ok(*u as f64),
            Payload::Float(f) => Ok(*f),
            Payload::String(s) => s
                .parse()
                .map_err(|_| ConvertError::mismatch("string", "f64")),
            other => Err(ConvertError::mismatch(other.kind(), "f64")),
        }
    }

    /// Convert to a bool; accepts the literal strings "true" and "false"
    pub fn to_bool(&self) -> Result<bool, ConvertError> {
        match self {
            Payload::Bool(b) => Ok(*b),
            Payload::String(s) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(ConvertError::mismatch("string", "bool")),
            },
            other => Err(ConvertError::mismatch(other.kind(), "bool")),
        }
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", serde_json::Value::from(self))
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl From<bool> for Payload {
    fn from(v: bool) -> Self {
        Payload::Bool(v)
    }
}

impl From<i32> for Payload {
    fn from(v: i32) -> Self {
        Payload::Int(v as i64)
    }
}

impl From<i64> for Payload {
    fn from(v: i64) -> Self {
        Payload::Int(v)
    }
}

impl From<u32> for Payload {
    fn from(v: u32) -> Self {
        Payload::Uint(v as u64)
    }
}

impl From<u64> for Payload {
    fn from(v: u64) -> Self {
        Payload::Uint(v)
    }
}

impl From<f64> for Payload {
    fn from(v: f64) -> Self {
        Payload::Float(v)
    }
}

impl From<&str> for Payload {
    fn from(v: &str) -> Self {
        Payload::String(v.to_owned())
    }
}

impl From<String> for Payload {
    fn from(v: String) -> Self {
        Payload::String(v)
    }
}

impl From<DateTime<Utc>> for Payload {
    fn from(v: DateTime<Utc>) -> Self {
        Payload::Time(v)
    }
}

impl From<Duration> for Payload {
    fn from(v: Duration) -> Self {
        Payload::Duration(v)
    }
}

impl From<Vec<Payload>> for Payload {
    fn from(v: Vec<Payload>) -> Self {
        Payload::Sequence(v)
    }
}

impl From<HashMap<String, Payload>> for Payload {
    fn from(v: HashMap<String, Payload>) -> Self {
        Payload::Mapping(v)
    }
}

impl From<&toml::Value> for Payload {
    fn from(v: &toml::Value) -> Self {
        match v {
            toml::Value::String(s) => Payload::String(s.clone()),
            toml::Value::Integer(i) => Payload::Int(*i),
            toml::Value::Float(f) => Payload::Float(*f),
            toml::Value::Boolean(b) => Payload::Bool(*b),
            toml::Value::Datetime(d) => DateTime::parse_from_rfc3339(&d.to_string())
                .map(|t| Payload::Time(t.with_timezone(&Utc)))
                .unwrap_or_else(|_| Payload::String(d.to_string())),
            toml::Value::Array(seq) => {
                Payload::Sequence(seq.iter().map(Payload::from).collect())
            }
            toml::Value::Table(map) => Payload::Mapping(
                map.iter().map(|(k, v)| (k.clone(), Payload::from(v))).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Payload::Null,
            serde_json::Value::Bool(b) => Payload::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Payload::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Payload::Uint(u)
                } else {
                    Payload::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Payload::String(s),
            serde_json::Value::Array(seq) => {
                Payload::Sequence(seq.into_iter().map(Payload::from).collect())
            }
            serde_json::Value::Object(map) => Payload::Mapping(
                map.into_iter().map(|(k, v)| (k, Payload::from(v))).collect(),
            ),
        }
    }
}

impl From<&Payload> for serde_json::Value {
    fn from(p: &Payload) -> Self {
        match p {
            Payload::Null => serde_json::Value::Null,
            Payload::Bool(b) => serde_json::Value::Bool(*b),
            Payload::Int(i) => serde_json::Value::from(*i),
            Payload::Uint(u) => serde_json::Value::from(*u),
            // NaN and infinities have no JSON form
            Payload::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Payload::String(s) => serde_json::Value::String(s.clone()),
            Payload::Time(t) => {
                serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Payload::Duration(d) => {
                serde_json::Value::String(humantime::format_duration(*d).to_string())
            }
            Payload::Bytes(b) => {
                serde_json::Value::Array(b.iter().map(|x| serde_json::Value::from(*x)).collect())
            }
            Payload::Sequence(seq) => {
                serde_json::Value::Array(seq.iter().map(serde_json::Value::from).collect())
            }
            Payload::Mapping(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Payload> for serde_json::Value {
    fn from(p: Payload) -> Self {
        serde_json::Value::from(&p)
    }
}
