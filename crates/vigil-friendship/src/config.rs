//! Configuration for the friendship service
//!
//! Controls how rejections are stored and how eagerly views are refreshed.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How a rejected request is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionMode {
    /// Update the edge in place to `rejected`; it stays queryable
    MarkRejected,
    /// Delete the edge outright
    Delete,
}

/// Configuration for the friendship service
///
/// # Examples
///
/// ```
/// use vigil_friendship::{FriendshipConfig, RejectionMode};
///
/// let config = FriendshipConfig::default();
/// assert_eq!(config.rejection_mode, RejectionMode::MarkRejected);
///
/// let config = FriendshipConfig::strict_delete();
/// assert_eq!(config.rejection_mode, RejectionMode::Delete);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendshipConfig {
    /// How `reject_request` stores the outcome
    /// Default: mark the edge rejected
    pub rejection_mode: RejectionMode,

    /// Refresh both parties' open views before a mutation call returns
    /// Default: true
    pub refresh_after_mutation: bool,

    /// Subscribe to store change notifications when a listener is started
    /// Default: true
    pub listen_for_changes: bool,

    /// Window in which bursts of external changes are folded into one refresh
    /// Default: 50 ms
    pub change_debounce_ms: u64,

    /// Upper bound on a single refresh (fetch + classify)
    /// Default: 10 seconds
    pub refresh_timeout_ms: u64,
}

impl Default for FriendshipConfig {
    fn default() -> Self {
        Self {
            rejection_mode: RejectionMode::MarkRejected,
            refresh_after_mutation: true,
            listen_for_changes: true,
            change_debounce_ms: 50,
            refresh_timeout_ms: 10_000,
        }
    }
}

/// File layout: the settings live under a `[friendship]` table
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    friendship: FriendshipConfig,
}

impl FriendshipConfig {
    /// Rejections delete the edge instead of keeping it
    pub fn strict_delete() -> Self {
        Self {
            rejection_mode: RejectionMode::Delete,
            ..Self::default()
        }
    }

    /// Parse from a TOML document containing a `[friendship]` table
    ///
    /// Missing keys (or a missing table) take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)?;
        file.friendship.validate()?;
        Ok(file.friendship)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject values that would make the service unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_timeout_ms == 0 {
            return Err(ConfigError::Invalid("refresh_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// Get the refresh timeout as Duration
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    /// Get the change debounce window as Duration
    pub fn change_debounce(&self) -> Duration {
        Duration::from_millis(self.change_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FriendshipConfig::default();
        assert_eq!(config.rejection_mode, RejectionMode::MarkRejected);
        assert!(config.refresh_after_mutation);
        assert!(config.listen_for_changes);
        assert_eq!(config.change_debounce(), Duration::from_millis(50));
        assert_eq!(config.refresh_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = FriendshipConfig::from_toml_str(
            r#"
            database = "ignored.db"

            [friendship]
            rejection_mode = "delete"
            change_debounce_ms = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.rejection_mode, RejectionMode::Delete);
        assert_eq!(config.change_debounce_ms, 5);
        assert!(config.refresh_after_mutation, "Unset keys keep defaults");
    }

    #[test]
    fn test_from_toml_empty() {
        assert_eq!(FriendshipConfig::from_toml_str("").unwrap(), FriendshipConfig::default());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            FriendshipConfig::from_toml_str("[friendship]\nrefresh_timeout_ms = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FriendshipConfig::from_toml_str("[friendship]\nrejection_mode = \"archive\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[friendship]\nrefresh_after_mutation = false\n").unwrap();

        let config = FriendshipConfig::load(&path).unwrap();
        assert!(!config.refresh_after_mutation);

        let missing = FriendshipConfig::load(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
