//! Built-in parser plugins

pub mod json;
