//! Pipeline declaration schema
//!
//! A pipeline is declared in TOML, YAML or JSON with the same logical
//! shape:
//!
//! ```toml
//! [settings]
//! id = "http-to-log"
//! lines = 2
//! buffer = 10
//! run = true
//!
//! [[inputs]]
//! [inputs.schedule]
//! interval = "1s"
//!
//! [[processors]]
//! [processors.mutator]
//! alias = "enrich"
//! [processors.mutator.filters.glob]
//! routing_key = ["http-*"]
//!
//! [[outputs]]
//! [outputs.log]
//! level = "info"
//! ```
//!
//! Plugin-specific options stay opaque at this layer; the builder hands
//! them to the plugin's own config struct through the tolerant decoder.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Keys with structural meaning inside any plugin table
const ALIAS_KEY: &str = "alias";
const FILTERS_KEY: &str = "filters";
const PARSER_KEY: &str = "parser";
const SERIALIZER_KEY: &str = "serializer";

/// A parsed pipeline declaration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub settings: PipelineSettings,
    pub inputs: Vec<PluginSet>,
    pub processors: Vec<PluginSet>,
    pub outputs: Vec<PluginSet>,
}

/// Pipeline-wide settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Unique id among loaded pipelines
    pub id: String,

    /// Parallel processor-stack count
    pub lines: usize,

    /// Autostart flag
    pub run: bool,

    /// Channel capacity for every channel in the pipeline
    pub buffer: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            lines: 1,
            run: false,
            buffer: 10,
        }
    }
}

/// One group of plugins: type name to configuration
///
/// Ordered so builds are deterministic.
pub type PluginSet = BTreeMap<String, PluginConf>;

/// Opaque per-plugin configuration table
///
/// Carries the plugin-specific options plus the structural keys
/// `alias`, `filters`, `parser` and `serializer`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PluginConf(toml::Table);

impl PluginConf {
    /// Wrap a raw table
    pub fn new(table: toml::Table) -> Self {
        Self(table)
    }

    /// The raw table, as handed to the plugin's `init`
    pub fn table(&self) -> &toml::Table {
        &self.0
    }

    /// Explicit alias, if declared
    pub fn alias(&self) -> Option<&str> {
        self.0.get(ALIAS_KEY).and_then(|v| v.as_str())
    }

    /// Attached filter set; empty when none is declared
    ///
    /// A filter entry that is not a table still names the filter and
    /// gets an empty configuration.
    pub fn filters(&self) -> Vec<(String, PluginConf)> {
        let Some(toml::Value::Table(filters)) = self.0.get(FILTERS_KEY) else {
            return Vec::new();
        };
        filters
            .iter()
            .map(|(name, value)| {
                let conf = match value {
                    toml::Value::Table(table) => PluginConf(table.clone()),
                    _ => PluginConf::default(),
                };
                (name.clone(), conf)
            })
            .collect()
    }

    /// Attached parser sub-plugin declaration: `(type name, config)`
    pub fn parser(&self) -> Option<(String, PluginConf)> {
        self.subplugin(PARSER_KEY)
    }

    /// Attached serializer sub-plugin declaration: `(type name, config)`
    pub fn serializer(&self) -> Option<(String, PluginConf)> {
        self.subplugin(SERIALIZER_KEY)
    }

    /// Sub-plugin tables declare exactly one entry: `{ <type> = {...} }`
    fn subplugin(&self, key: &str) -> Option<(String, PluginConf)> {
        let toml::Value::Table(table) = self.0.get(key)? else {
            return None;
        };
        let (name, value) = table.iter().next()?;
        let conf = match value {
            toml::Value::Table(inner) => PluginConf(inner.clone()),
            _ => PluginConf::default(),
        };
        Some((name.clone(), conf))
    }
}

impl PipelineConfig {
    /// Load a declaration from a file, dispatching on the extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::io(path.display().to_string(), e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let mut config = match extension {
            "toml" => Self::from_toml(&contents)?,
            "yaml" | "yml" => Self::from_yaml(&contents)?,
            "json" => Self::from_json(&contents)?,
            _ => return Err(ConfigError::unknown_format(path.display().to_string())),
        };
        config.apply_defaults();

        if config.settings.id.is_empty() {
            return Err(ConfigError::missing_id(path.display().to_string()));
        }
        Ok(config)
    }

    /// Parse a TOML declaration
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Parse a YAML declaration
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Parse a JSON declaration
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Map zero-valued settings back to their defaults
    ///
    /// A declared `lines = 0` or `buffer = 0` means "default", not
    /// "none".
    pub fn apply_defaults(&mut self) {
        if self.settings.lines == 0 {
            self.settings.lines = 1;
        }
        if self.settings.buffer == 0 {
            self.settings.buffer = 10;
        }
    }
}

/// Load every recognized declaration file in a directory
///
/// Files with unknown extensions are skipped; duplicate pipeline ids
/// are an error. A path to a single file loads just that file.
pub fn load_path(path: impl AsRef<Path>) -> Result<Vec<PipelineConfig>> {
    let path = path.as_ref();
    if path.is_file() {
        return Ok(vec![PipelineConfig::from_file(path)?]);
    }

    let entries = fs::read_dir(path).map_err(|e| ConfigError::io(path.display().to_string(), e))?;
    let mut configs: Vec<PipelineConfig> = Vec::new();
    let mut files: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("toml" | "yaml" | "yml" | "json")
            )
        })
        .collect();
    files.sort();

    for file in files {
        let config = PipelineConfig::from_file(&file)?;
        if configs
            .iter()
            .any(|c| c.settings.id == config.settings.id)
        {
            return Err(ConfigError::duplicate_id(config.settings.id));
        }
        configs.push(config);
    }
    Ok(configs)
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
