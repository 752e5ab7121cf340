//! TOML configuration parsing and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::contents::RetentionMode;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Document store connection
    #[serde(default)]
    pub store: StoreConfig,
    /// Checkpoint retention
    #[serde(default)]
    pub checkpoints: CheckpointsConfig,
    /// Activity logging
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Contents layer settings
    #[serde(default)]
    pub contents: ContentsConfig,
}

/// Document store connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "documentdb"/"mongodb" or "memory"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// The URI to connect to the MongoDB instance
    #[serde(default = "default_uri")]
    pub uri: String,
    /// Replica set for mongodb, if any; empty means none
    #[serde(default)]
    pub replica_set: String,
    /// Database holding both collections
    #[serde(default = "default_database_name")]
    pub database_name: String,
    /// Collection storing notebooks and directories
    #[serde(default = "default_entries_collection")]
    pub entries_collection: String,
    /// Collection storing checkpoints
    #[serde(default = "default_checkpoints_collection")]
    pub checkpoints_collection: String,
}

fn default_backend() -> String {
    "documentdb".to_string()
}

fn default_uri() -> String {
    "mongodb://localhost:27017/".to_string()
}

fn default_database_name() -> String {
    "ipython".to_string()
}

fn default_entries_collection() -> String {
    "notebooks".to_string()
}

fn default_checkpoints_collection() -> String {
    "checkpoints".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            uri: default_uri(),
            replica_set: String::new(),
            database_name: default_database_name(),
            entries_collection: default_entries_collection(),
            checkpoints_collection: default_checkpoints_collection(),
        }
    }
}

/// Checkpoint retention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointsConfig {
    /// Save all checkpoints or keep only last
    #[serde(default = "default_history")]
    pub history: bool,
}

fn default_history() -> bool {
    true
}

impl Default for CheckpointsConfig {
    fn default() -> Self {
        Self {
            history: default_history(),
        }
    }
}

impl CheckpointsConfig {
    /// Retention mode selected by `history`
    pub fn retention(&self) -> RetentionMode {
        RetentionMode::from_history_flag(self.history)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Activity log file; no activity log when unset
    #[serde(default)]
    pub log_file: Option<String>,
    /// "DEBUG" also records every successful operation
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            log_level: default_log_level(),
        }
    }
}

/// Contents layer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentsConfig {
    /// Identity recorded on written entries; resolved from the environment when unset
    #[serde(default)]
    pub owner: Option<String>,
}

/// Configuration loader for nbvault.
#[derive(Debug, Clone)]
pub struct ConfigurationLoader {
    config_path: PathBuf,
    /// Loaded configuration
    pub config: Configuration,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None, uses `config/nbvault.toml`
    ///   when present and defaults otherwise.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config/nbvault.toml"));

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            Configuration::default()
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from TOML file.
    fn load_config(path: &Path) -> Result<Configuration> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Path the configuration was (or would have been) read from.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get configuration value by dot-notation key.
    pub fn get_string(&self, key: &str) -> Option<String> {
        let config = &self.config;
        match key {
            "store.backend" => Some(config.store.backend.clone()),
            "store.uri" => Some(config.store.uri.clone()),
            "store.replica_set" => Some(config.store.replica_set.clone()),
            "store.database_name" => Some(config.store.database_name.clone()),
            "store.entries_collection" => Some(config.store.entries_collection.clone()),
            "store.checkpoints_collection" => Some(config.store.checkpoints_collection.clone()),
            "logging.log_file" => config.logging.log_file.clone(),
            "logging.log_level" => Some(config.logging.log_level.clone()),
            "contents.owner" => config.contents.owner.clone(),
            _ => None,
        }
    }

    /// Get boolean configuration value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match key {
            "checkpoints.history" => Some(self.config.checkpoints.history),
            _ => None,
        }
    }
}
