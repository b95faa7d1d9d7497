//! Error types for profile configuration

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Failed to parse profile {path}, line {line}: {message}")]
    ProfileParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("No profiles found in {0}")]
    NoProfiles(PathBuf),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
