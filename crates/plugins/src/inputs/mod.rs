//! Built-in input plugins

pub mod schedule;
pub mod tcp;
