//! Document Store Abstraction
//!
//! The contents layer never talks to a database driver directly. It speaks
//! to a [`DocumentStore`]: a filter-based collection API (find, count,
//! upsert, remove) over named collections of BSON documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   ContentsManager   │
//! │  (host-facing API)  │
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │    DocumentStore    │  <-- Trait
//! │      (async)        │
//! └──────────┬──────────┘
//!            │
//!     ┌──────┴──────┐
//!     │             │
//! ┌───▼────┐  ┌─────▼─────┐
//! │ Memory │  │ DocumentDB│
//! │ Store  │  │   Store   │
//! └────────┘  └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nbvault::store::{DocumentStore, MemoryDocumentStore, UpdateOptions};
//! use bson::doc;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let store = MemoryDocumentStore::new();
//!
//!     store
//!         .update("notebooks", doc! { "path": "a" }, doc! { "type": "directory" }, UpdateOptions::upsert())
//!         .await?;
//!
//!     let found = store.find_one("notebooks", doc! { "path": "a" }, None).await?;
//!     assert!(found.is_some());
//!     Ok(())
//! }
//! ```

mod memory_backend;
mod traits;

pub use memory_backend::*;
pub use traits::*;

#[cfg(feature = "storage-documentdb")]
mod documentdb_backend;

#[cfg(feature = "storage-documentdb")]
pub use documentdb_backend::DocumentDbStore;
