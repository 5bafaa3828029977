//! Error types for friendship configuration

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a [`crate::FriendshipConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The TOML did not parse
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value was out of range
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}
