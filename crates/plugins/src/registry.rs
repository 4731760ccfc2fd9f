//! Plugin registry - configuration-driven plugin instantiation
//!
//! Maps plugin type names to factories, one table per plugin kind.
//! Factories take no arguments and return a zero-configured instance;
//! configuration is applied later through each plugin's `init`.
//!
//! The registry is assembled once at startup ([`Registry::with_builtins`]
//! or explicit `add_*` calls) and treated as immutable afterwards.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = Registry::new();
//! registry.add_input("schedule", || Box::new(Schedule::default()));
//!
//! let input = registry.create_input("schedule")
//!     .ok_or_else(|| /* unknown plugin */)?;
//! ```

use std::collections::HashMap;

use neptunus_core::{Filter, Input, Output, Parser, Processor, Serializer};

/// One kind's table of factories
struct FactoryTable<T: ?Sized> {
    kind: &'static str,
    factories: HashMap<&'static str, Box<dyn Fn() -> Box<T> + Send + Sync>>,
}

impl<T: ?Sized> FactoryTable<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: HashMap::new(),
        }
    }

    fn add(&mut self, name: &'static str, factory: impl Fn() -> Box<T> + Send + Sync + 'static) {
        if self.factories.contains_key(name) {
            panic!("{} plugin '{}' already registered", self.kind, name);
        }
        self.factories.insert(name, Box::new(factory));
    }

    fn create(&self, name: &str) -> Option<Box<T>> {
        self.factories.get(name).map(|factory| factory())
    }

    fn known(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Process-wide plugin lookup table, keyed by kind and type name
pub struct Registry {
    inputs: FactoryTable<dyn Input>,
    processors: FactoryTable<dyn Processor>,
    filters: FactoryTable<dyn Filter>,
    outputs: FactoryTable<dyn Output>,
    parsers: FactoryTable<dyn Parser>,
    serializers: FactoryTable<dyn Serializer>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inputs: FactoryTable::new("input"),
            processors: FactoryTable::new("processor"),
            filters: FactoryTable::new("filter"),
            outputs: FactoryTable::new("output"),
            parsers: FactoryTable::new("parser"),
            serializers: FactoryTable::new("serializer"),
        }
    }

    /// Create a registry with every built-in plugin registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::register_builtins(&mut registry);
        registry
    }

    /// Register an input factory
    ///
    /// # Panics
    ///
    /// Panics if the name is already taken; registration happens once
    /// at startup, so a duplicate is a programming error.
    pub fn add_input(
        &mut self,
        name: &'static str,
        factory: impl Fn() -> Box<dyn Input> + Send + Sync + 'static,
    ) {
        self.inputs.add(name, factory);
    }

    /// Register a processor factory
    pub fn add_processor(
        &mut self,
        name: &'static str,
        factory: impl Fn() -> Box<dyn Processor> + Send + Sync + 'static,
    ) {
        self.processors.add(name, factory);
    }

    /// Register a filter factory
    pub fn add_filter(
        &mut self,
        name: &'static str,
        factory: impl Fn() -> Box<dyn Filter> + Send + Sync + 'static,
    ) {
        self.filters.add(name, factory);
    }

    /// Register an output factory
    pub fn add_output(
        &mut self,
        name: &'static str,
        factory: impl Fn() -> Box<dyn Output> + Send + Sync + 'static,
    ) {
        self.outputs.add(name, factory);
    }

    /// Register a parser factory
    pub fn add_parser(
        &mut self,
        name: &'static str,
        factory: impl Fn() -> Box<dyn Parser> + Send + Sync + 'static,
    ) {
        self.parsers.add(name, factory);
    }

    /// Register a serializer factory
    pub fn add_serializer(
        &mut self,
        name: &'static str,
        factory: impl Fn() -> Box<dyn Serializer> + Send + Sync + 'static,
    ) {
        self.serializers.add(name, factory);
    }

    /// Create a zero-configured input by type name
    pub fn create_input(&self, name: &str) -> Option<Box<dyn Input>> {
        self.inputs.create(name)
    }

    /// Create a zero-configured processor by type name
    pub fn create_processor(&self, name: &str) -> Option<Box<dyn Processor>> {
        self.processors.create(name)
    }

    /// Create a zero-configured filter by type name
    pub fn create_filter(&self, name: &str) -> Option<Box<dyn Filter>> {
        self.filters.create(name)
    }

    /// Create a zero-configured output by type name
    pub fn create_output(&self, name: &str) -> Option<Box<dyn Output>> {
        self.outputs.create(name)
    }

    /// Create a zero-configured parser by type name
    pub fn create_parser(&self, name: &str) -> Option<Box<dyn Parser>> {
        self.parsers.create(name)
    }

    /// Create a zero-configured serializer by type name
    pub fn create_serializer(&self, name: &str) -> Option<Box<dyn Serializer>> {
        self.serializers.create(name)
    }

    /// Registered input type names, sorted
    pub fn known_inputs(&self) -> Vec<&'static str> {
        self.inputs.known()
    }

    pub fn known_processors(&self) -> Vec<&'static str> {
        self.processors.known()
    }

    pub fn known_filters(&self) -> Vec<&'static str> {
        self.filters.known()
    }

    pub fn known_outputs(&self) -> Vec<&'static str> {
        self.outputs.known()
    }

    pub fn known_parsers(&self) -> Vec<&'static str> {
        self.parsers.known()
    }

    pub fn known_serializers(&self) -> Vec<&'static str> {
        self.serializers.known()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
