//! Error types for build orchestration

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Orchestration errors
///
/// A build or test that runs to completion with a non-zero exit code is not
/// an error; it is reported through `BuildResult` so callers can decide
/// whether to continue a multi-step pipeline. These variants cover failures
/// where there is nothing to continue with.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] conforge_config::ConfigError),

    #[error("Failed to invoke build tool: {message} ({hint})")]
    Invocation { message: String, hint: String },

    #[error("Failed to parse requirements manifest: {0}")]
    ManifestParse(String),

    #[error("Invalid recipe {path}: {message}")]
    Recipe { path: PathBuf, message: String },

    #[error("Duplicate recipe name: {0}")]
    DuplicateRecipe(String),

    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
