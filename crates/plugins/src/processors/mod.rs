//! Built-in processor plugins

pub mod drop;
pub mod mutator;
