//! Error types for the CLI application.

use thiserror::Error;
use vigil_domain::RelationshipError;
use vigil_friendship::ConfigError;
use vigil_store::StoreError;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid friendship settings
    #[error(transparent)]
    Friendship(#[from] ConfigError),

    /// A relationship operation was refused or failed
    #[error("{0}")]
    Relationship(#[from] RelationshipError),

    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No profile matches the given id or name
    #[error("No user matches '{0}'")]
    UnknownUser(String),

    /// More than one profile has the given display name
    #[error("{count} users are named '{name}'; use an id instead")]
    AmbiguousUser {
        /// Name that was looked up
        name: String,
        /// Number of matching profiles
        count: usize,
    },
}
