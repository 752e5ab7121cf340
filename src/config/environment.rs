//! Environment variable loading and management.
//!
//! Deployment-specific settings (connection string, replica set, database,
//! owner identity) usually come from the environment rather than the TOML
//! file. Variables override whatever the file configured.

use std::env;
use std::path::Path;

use super::config::Configuration;

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Nothing is loaded when None.
    pub fn new(env_file: Option<&Path>) -> Self {
        // Only load a .env file if an explicit path was provided, so tests
        // never pick up a stray repository .env
        if let Some(env_path) = env_file {
            if env_path.exists() {
                if let Err(e) = dotenv::from_path(env_path) {
                    tracing::warn!("Failed to load .env file: {}", e);
                }
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }

    /// The .env file this loader read, if any.
    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }

    /// `NBVAULT_MONGO_URI`, the document store connection string.
    pub fn mongo_uri(&self) -> Option<String> {
        non_empty("NBVAULT_MONGO_URI")
    }

    /// `NBVAULT_REPLICA_SET`; an empty value clears the replica set.
    pub fn replica_set(&self) -> Option<String> {
        env::var("NBVAULT_REPLICA_SET").ok()
    }

    /// `NBVAULT_DATABASE`, the database holding both collections.
    pub fn database_name(&self) -> Option<String> {
        non_empty("NBVAULT_DATABASE")
    }

    /// `NBVAULT_BACKEND`: "documentdb", "mongodb" or "memory".
    pub fn backend(&self) -> Option<String> {
        non_empty("NBVAULT_BACKEND")
    }

    /// `NBVAULT_CHECKPOINT_HISTORY`; accepts true/false, 1/0, yes/no.
    pub fn checkpoint_history(&self) -> Option<bool> {
        let raw = env::var("NBVAULT_CHECKPOINT_HISTORY").ok()?;
        match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }

    /// Identity written to entries: `NBVAULT_OWNER`, then the login name.
    pub fn owner(&self) -> Option<String> {
        non_empty("NBVAULT_OWNER")
            .or_else(|| non_empty("USER"))
            .or_else(|| non_empty("USERNAME"))
    }

    /// Overlay environment settings onto `config`.
    pub fn apply(&self, config: &mut Configuration) {
        if let Some(uri) = self.mongo_uri() {
            config.store.uri = uri;
        }
        if let Some(replica_set) = self.replica_set() {
            config.store.replica_set = replica_set;
        }
        if let Some(database) = self.database_name() {
            config.store.database_name = database;
        }
        if let Some(backend) = self.backend() {
            config.store.backend = backend;
        }
        if let Some(history) = self.checkpoint_history() {
            config.checkpoints.history = history;
        }
        if config.contents.owner.is_none() {
            config.contents.owner = self.owner();
        }
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
