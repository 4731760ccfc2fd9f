//! Neptunus - Configuration
//!
//! Pipeline declarations in TOML, YAML or JSON with one logical schema.
//! Only the structural shell is typed here; plugin-specific options are
//! carried as opaque tables and decoded by the plugins themselves.

mod error;
mod pipeline;

pub use error::{ConfigError, Result};
pub use pipeline::{load_path, PipelineConfig, PipelineSettings, PluginConf, PluginSet};
