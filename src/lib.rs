//! nbvault - Hierarchical notebook storage over a document database
//!
//! nbvault stores directories and notebooks as rows in a document collection
//! and exposes them as a file-system-like tree, with point-in-time
//! checkpoints kept in a second collection:
//!
//! - **`store`** - Document store abstraction (in-memory and MongoDB/DocumentDB backends)
//! - **`contents`** - Path-addressed entries, checkpoints and the host-facing facade
//! - **`observability`** - Markdown activity log alongside `tracing` events
//! - **`config`** - TOML configuration and environment overrides
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! nbvault = { version = "0.3", features = ["storage-documentdb"] }
//! # Or enable everything:
//! nbvault = { version = "0.3", features = ["all"] }
//! ```
//!
//! # Example: Using the in-memory store
//!
//! ```ignore
//! use nbvault::prelude::*;
//! use std::sync::Arc;
//!
//! async fn example() -> ContentsResult<()> {
//!     let contents = ContentsManager::builder(Arc::new(MemoryDocumentStore::new()))
//!         .retention(RetentionMode::KeepLast)
//!         .build()
//!         .await?;
//!
//!     contents.new_notebook("analysis.ipynb").await?;
//!     let checkpoint = contents.create_checkpoint("analysis.ipynb").await?;
//!     contents.restore_checkpoint(&checkpoint.id, "analysis.ipynb").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Example: Building from configuration
//!
//! ```ignore
//! use nbvault::config::{ConfigurationLoader, EnvironmentLoader};
//! use nbvault::contents::ContentsManager;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let mut config = ConfigurationLoader::new(None)?.config;
//!     EnvironmentLoader::new(None).apply(&mut config);
//!
//!     let contents = ContentsManager::from_config(&config).await?;
//!     println!("{}", contents.info_string());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Document store abstraction and backends
pub mod store;

/// Notebook and directory contents with checkpoints
pub mod contents;

/// Activity logging
pub mod observability;

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

/// Prelude module for convenient imports
pub mod prelude {
    #[cfg(feature = "config")]
    pub use crate::config::{Configuration, ConfigurationLoader, EnvironmentLoader};

    pub use crate::observability::Logger;

    pub use crate::contents::{
        CheckpointInfo, ContentsError, ContentsManager, ContentsResult, EntryKind, Model,
        RetentionMode, SaveModel,
    };

    pub use crate::store::{DocumentStore, MemoryDocumentStore, StoreBuilder, StoreError};

    #[cfg(feature = "storage-documentdb")]
    pub use crate::store::DocumentDbStore;
}
