//! Configuration management.
//!
//! This module provides configuration loading through TOML files and
//! environment overrides via `.env` files and process variables.
//!
//! # Example
//!
//! ```no_run
//! use nbvault::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! let env = EnvironmentLoader::new(None);
//! let mut config = ConfigurationLoader::new(Some(Path::new("config/nbvault.toml")))
//!     .unwrap()
//!     .config;
//! env.apply(&mut config);
//!
//! println!("Database: {}", config.store.database_name);
//! ```

pub mod config;
pub mod environment;

// Re-export main types for convenience
pub use self::config::{
    CheckpointsConfig, Configuration, ConfigurationLoader, ContentsConfig, LoggingConfig,
    StoreConfig,
};
pub use self::environment::EnvironmentLoader;
