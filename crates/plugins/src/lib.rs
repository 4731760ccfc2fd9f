//! Neptunus - Plugins
//!
//! The plugin registry and the built-in plugin set.
//!
//! # Built-ins
//!
//! | Kind | Plugins |
//! |------|---------|
//! | inputs | `schedule`, `tcp` |
//! | processors | `drop`, `mutator` |
//! | filters | `glob`, `noerrors` |
//! | outputs | `devnull`, `log` |
//! | parsers | `json` |
//! | serializers | `json` |
//!
//! External plugin crates register their own factories on the same
//! [`Registry`] before pipelines are built.

mod registry;

pub mod filters;
pub mod inputs;
pub mod outputs;
pub mod parsers;
pub mod processors;
pub mod serializers;

pub use registry::Registry;

/// Register every built-in plugin on a registry
///
/// The explicit init entry point: call once at startup, before any
/// pipeline is built.
pub fn register_builtins(registry: &mut Registry) {
    registry.add_input("schedule", || Box::new(inputs::schedule::Schedule::default()));
    registry.add_input("tcp", || Box::new(inputs::tcp::Tcp::default()));

    registry.add_processor("drop", || Box::new(processors::drop::Drop::default()));
    registry.add_processor("mutator", || Box::new(processors::mutator::Mutator::default()));

    registry.add_filter("glob", || Box::new(filters::glob::Glob::default()));
    registry.add_filter("noerrors", || Box::new(filters::noerrors::NoErrors::default()));

    registry.add_output("devnull", || Box::new(outputs::devnull::Devnull::default()));
    registry.add_output("log", || Box::new(outputs::log::Log::default()));

    registry.add_parser("json", || Box::new(parsers::json::Json::default()));

    registry.add_serializer("json", || Box::new(serializers::json::Json::default()));
}
