//! Path index: existence and type lookups keyed by `path`.

use bson::doc;
use std::sync::Arc;

use super::errors::ContentsResult;
use super::models::{fields, EntryKind};
use super::paths;
use crate::store::DocumentStore;

/// Existence and type queries over the entries collection
#[derive(Clone)]
pub struct PathIndex {
    store: Arc<dyn DocumentStore>,
    entries: String,
}

impl PathIndex {
    /// Create an index over the `entries` collection
    pub fn new(store: Arc<dyn DocumentStore>, entries: impl Into<String>) -> Self {
        Self {
            store,
            entries: entries.into(),
        }
    }

    /// Whether any entry, of any kind, lives at `path`
    pub async fn exists(&self, path: &str) -> ContentsResult<bool> {
        let count = self
            .store
            .count(&self.entries, doc! { fields::PATH: path })
            .await?;
        Ok(count > 0)
    }

    /// Whether exactly one notebook lives at `path`
    pub async fn notebook_exists(&self, path: &str) -> ContentsResult<bool> {
        let count = self
            .store
            .count(
                &self.entries,
                doc! { fields::PATH: path, fields::TYPE: EntryKind::Notebook.as_str() },
            )
            .await?;
        Ok(count == 1)
    }

    /// Whether a directory lives at `path`
    pub async fn directory_exists(&self, path: &str) -> ContentsResult<bool> {
        let count = self
            .store
            .count(
                &self.entries,
                doc! { fields::PATH: path, fields::TYPE: EntryKind::Directory.as_str() },
            )
            .await?;
        Ok(count > 0)
    }

    /// Infer the kind of `path`: notebook by suffix, directory when
    /// something is stored there, plain file otherwise
    pub async fn type_of(&self, path: &str) -> ContentsResult<EntryKind> {
        if paths::is_notebook_path(path) {
            Ok(EntryKind::Notebook)
        } else if self.exists(path).await? {
            Ok(EntryKind::Directory)
        } else {
            Ok(EntryKind::File)
        }
    }
}
