//! Unified error types for the quadlify workspace.
//!
//! These are the fatal, whole-operation failures. Per-service problems are
//! collected as [`crate::diagnostic::Problem`] values instead.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum QuadlifyError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The input could not be parsed as YAML.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },

    /// The input document is empty.
    #[error("empty compose document")]
    EmptyDocument,

    /// The input document does not have the shape of a compose file.
    #[error("invalid compose document: {message}")]
    InvalidDocument {
        /// Description of what is wrong with the document.
        message: String,
    },

    /// Neither the document nor the caller supplied a project name.
    #[error("no project name: the document has no `name` and none was supplied")]
    MissingProjectName,

    /// No start order exists because services depend on each other.
    #[error("dependency cycle through service \"{service}\"")]
    DependencyCycle {
        /// A service on the cycle.
        service: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, QuadlifyError>;
