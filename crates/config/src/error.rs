//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating pipeline declarations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a declaration file
    #[error("failed to read pipeline file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse pipeline declaration: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// Failed to parse YAML
    #[error("failed to parse pipeline declaration: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    /// Failed to parse JSON
    #[error("failed to parse pipeline declaration: {0}")]
    ParseJson(#[from] serde_json::Error),

    /// The file extension does not name a supported format
    #[error("unknown pipeline file extension: '{path}', expected .toml, .yaml, .yml or .json")]
    UnknownFormat {
        /// Path to the offending file
        path: String,
    },

    /// The declaration has no pipeline id
    #[error("pipeline declaration '{path}' is missing settings.id")]
    MissingId {
        /// Path to the offending file
        path: String,
    },

    /// Two loaded declarations share a pipeline id
    #[error("duplicate pipeline id '{id}'")]
    DuplicateId {
        /// The conflicting id
        id: String,
    },
}

impl ConfigError {
    /// Create an Io error with file context
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an UnknownFormat error
    pub fn unknown_format(path: impl Into<String>) -> Self {
        Self::UnknownFormat { path: path.into() }
    }

    /// Create a MissingId error
    pub fn missing_id(path: impl Into<String>) -> Self {
        Self::MissingId { path: path.into() }
    }

    /// Create a DuplicateId error
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }
}
