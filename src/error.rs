//! Error types for the patch engine.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for patch operations.
///
/// Only read failures escape a file operation. The drivers turn every other
/// error into a fallback outcome.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Parse error for {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Tree-sitter query error: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("Dialect not supported: {0}")]
    UnsupportedDialect(String),

    #[error("Could not find {target}")]
    LocatorMiss { target: String },

    #[error("Transform failed: {message}")]
    TransformFailed { message: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown recipe: {0}")]
    UnknownRecipe(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PatchError {
    /// Creates a locator miss for the given target description.
    pub fn locator_miss(target: impl Into<String>) -> Self {
        PatchError::LocatorMiss {
            target: target.into(),
        }
    }
}

/// A specialized Result type for patch operations.
pub type Result<T> = std::result::Result<T, PatchError>;
