//! Built-in serializer plugins

pub mod json;
