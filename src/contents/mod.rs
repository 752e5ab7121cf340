//! Hierarchical Notebook Contents
//!
//! File-system-like storage (directories, notebooks, rename, delete) over a
//! flat [`DocumentStore`](crate::store::DocumentStore), with point-in-time
//! checkpoints kept in a second collection.
//!
//! Entries and checkpoints are independent rows linked only by their `path`
//! string. Multi-step operations (delete, rename, save-with-checkpoint) are
//! sequences of single-row writes, not transactions; concurrent writers to
//! one path are last-write-wins.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nbvault::contents::{ContentsManager, SaveModel};
//! use nbvault::store::MemoryDocumentStore;
//! use std::sync::Arc;
//!
//! async fn example() -> nbvault::contents::ContentsResult<()> {
//!     let contents = ContentsManager::builder(Arc::new(MemoryDocumentStore::new()))
//!         .owner("alice")
//!         .build()
//!         .await?;
//!
//!     contents.new_directory("a").await?;
//!     contents.save(SaveModel::notebook(serde_json::json!({ "cells": [] })), "a/b.ipynb").await?;
//!     contents.rename_file("a/b.ipynb", "a/c.ipynb").await?;
//!     Ok(())
//! }
//! ```

pub mod checkpoints;
pub mod codec;
pub mod entries;
pub mod errors;
pub mod index;
pub mod manager;
pub mod models;
pub mod paths;

// Re-export key types for convenience
pub use checkpoints::{CheckpointManager, RetentionMode};
pub use codec::{JsonNotebookCodec, NoopTrustPolicy, NotebookCodec, TrustPolicy};
pub use entries::EntryManager;
pub use errors::{ContentsError, ContentsResult};
pub use index::PathIndex;
pub use manager::{ContentsManager, ContentsManagerBuilder};
pub use models::{CheckpointInfo, Entry, EntryKind, Model, ModelContent, SaveModel};
