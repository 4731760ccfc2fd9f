//! Pipeline error types

use thiserror::Error;

use neptunus_core::PluginError;

/// Errors raised while assembling a pipeline from its declaration
#[derive(Debug, Error)]
pub enum BuildError {
    /// The declaration has no inputs
    #[error("at least one input required")]
    NoInputs,

    /// The declaration has no outputs
    #[error("at least one output required")]
    NoOutputs,

    /// No factory registered under this name
    #[error("unknown {kind} plugin in pipeline configuration: {name}")]
    UnknownPlugin {
        /// Plugin kind: input, processor, output, filter, parser, serializer
        kind: &'static str,
        /// The unresolved type name
        name: String,
    },

    /// A plugin rejected its configuration or sub-plugin attachment
    #[error("{kind} plugin '{name}' configuration error: {source}")]
    PluginInit {
        kind: &'static str,
        name: String,
        #[source]
        source: PluginError,
    },
}

impl BuildError {
    pub(crate) fn unknown(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownPlugin {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn init(kind: &'static str, name: impl Into<String>, source: PluginError) -> Self {
        Self::PluginInit {
            kind,
            name: name.into(),
            source,
        }
    }
}

/// Errors raised by the pipeline server
#[derive(Debug, Error)]
pub enum ServerError {
    /// No pipeline loaded under this id
    #[error("unknown pipeline '{id}'")]
    UnknownPipeline { id: String },

    /// A pipeline with this id is already loaded
    #[error("pipeline '{id}' already loaded")]
    DuplicatePipeline { id: String },

    /// Start requested while the pipeline runs
    #[error("pipeline '{id}' is already running")]
    AlreadyRunning { id: String },

    /// Stop requested while the pipeline does not run
    #[error("pipeline '{id}' is not running")]
    NotRunning { id: String },

    /// The pipeline failed to build from its declaration
    #[error(transparent)]
    Build(#[from] BuildError),
}

impl ServerError {
    pub(crate) fn unknown(id: impl Into<String>) -> Self {
        Self::UnknownPipeline { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_display() {
        let err = BuildError::unknown("input", "opensearch");
        assert!(err.to_string().contains("unknown input plugin"));
        assert!(err.to_string().contains("opensearch"));

        let err = BuildError::init("output", "log-0", PluginError::config("bad level"));
        assert!(err.to_string().contains("log-0"));
        assert!(err.to_string().contains("bad level"));
    }

    #[test]
    fn test_server_error_display() {
        let err = ServerError::NotRunning { id: "pipe".into() };
        assert_eq!(err.to_string(), "pipeline 'pipe' is not running");
    }
}
