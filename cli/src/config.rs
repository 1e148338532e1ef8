//! Coordinator Configuration
//!
//! Handles loading and saving election configuration from TOML files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sotto_core::ElectionParams;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Full coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SottoConfig {
    /// Election shape
    #[serde(default)]
    pub election: ElectionSettings,

    /// Coordinator identity
    #[serde(default)]
    pub coordinator: CoordinatorSettings,

    /// File layout inside the data directory
    #[serde(default)]
    pub storage: StorageSettings,
}

impl Default for SottoConfig {
    fn default() -> Self {
        Self {
            election: ElectionSettings::default(),
            coordinator: CoordinatorSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl SottoConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Load from an explicit path, from the data directory, or fall back to
    /// defaults when no config file exists yet
    pub fn resolve(config_path: Option<&Path>, data_dir: &Path) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::load(path),
            None => {
                let path = default_config_path(data_dir);
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), ConfigError> {
        self.election
            .params()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Election shape settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSettings {
    /// State tree depth
    pub state_tree_depth: usize,

    /// Message tree depth
    pub message_tree_depth: usize,

    /// Vote option tree depth
    pub vote_option_tree_depth: usize,

    /// Messages per processed batch
    pub message_batch_size: usize,

    /// Number of selectable vote options
    pub max_vote_options: u64,
}

impl ElectionSettings {
    /// The engine-level parameters this section describes
    pub fn params(&self) -> ElectionParams {
        ElectionParams {
            state_tree_depth: self.state_tree_depth,
            message_tree_depth: self.message_tree_depth,
            vote_option_tree_depth: self.vote_option_tree_depth,
            message_batch_size: self.message_batch_size,
            max_vote_options: self.max_vote_options,
        }
    }
}

impl Default for ElectionSettings {
    fn default() -> Self {
        let params = ElectionParams::default();
        Self {
            state_tree_depth: params.state_tree_depth,
            message_tree_depth: params.message_tree_depth,
            vote_option_tree_depth: params.vote_option_tree_depth,
            message_batch_size: params.message_batch_size,
            max_vote_options: params.max_vote_options,
        }
    }
}

/// Coordinator identity settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinatorSettings {
    /// Serialized coordinator public key (`sottopk.` string); participants
    /// encrypt their messages to this key
    pub pub_key: Option<String>,
}

/// File layout settings, resolved relative to the data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Chain event log file
    pub event_log: String,

    /// Sealed tally output file
    pub tally_file: String,

    /// Per-message audit trail file
    pub audit_file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            event_log: "events.json".to_string(),
            tally_file: "tally.json".to_string(),
            audit_file: "audit.csv".to_string(),
        }
    }
}

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("vote", "sotto", "sotto")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".sotto"))
}

/// Get default config file path
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = SottoConfig::default();
        assert_eq!(config.election.params(), ElectionParams::default());
        assert_eq!(config.storage.event_log, "events.json");
        assert!(config.coordinator.pub_key.is_none());
    }

    #[test]
    fn test_save_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = SottoConfig::default();
        config.coordinator.pub_key = Some("sottopk.42".to_string());
        config.save(&path).unwrap();

        let loaded = SottoConfig::load(&path).unwrap();
        assert_eq!(loaded.election.message_batch_size, config.election.message_batch_size);
        assert_eq!(loaded.coordinator.pub_key.as_deref(), Some("sottopk.42"));
    }

    #[test]
    fn test_load_rejects_invalid_params() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = SottoConfig::default();
        config.election.message_batch_size = 0;
        config.save(&path).unwrap();

        assert!(matches!(
            SottoConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_resolve_defaults_when_missing() {
        let dir = tempdir().unwrap();

        let config = SottoConfig::resolve(None, dir.path()).unwrap();
        assert_eq!(config.election.params(), ElectionParams::default());
    }

    #[test]
    fn test_resolve_explicit_path_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        assert!(matches!(
            SottoConfig::resolve(Some(&missing), dir.path()),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[election]\nstate_tree_depth = 8\nmessage_tree_depth = 8\nvote_option_tree_depth = 3\nmessage_batch_size = 5\nmax_vote_options = 8\n").unwrap();

        let config = SottoConfig::load(&path).unwrap();
        assert_eq!(config.election.state_tree_depth, 8);
        assert_eq!(config.storage.tally_file, "tally.json");
    }
}
