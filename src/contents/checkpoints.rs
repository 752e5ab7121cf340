//! Checkpoint manager: point-in-time copies of entries.
//!
//! A checkpoint row is a copy of every entry field except the store
//! identity, plus the checkpoint id (`cp`). Ids are decimal counters scoped
//! per path. Two retention modes exist:
//!
//! - [`RetentionMode::History`] appends one row per checkpoint, keyed by
//!   `(path, cp)`;
//! - [`RetentionMode::KeepLast`] keeps a single row per entry, keyed by the
//!   entry's store identity and overwritten in place; the id still advances.

use bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::errors::{ContentsError, ContentsResult};
use super::models::{fields, CheckpointInfo};
use super::paths;
use crate::store::{DocumentStore, UpdateOptions};

/// Checkpoint retention policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionMode {
    /// Keep every checkpoint ever created
    #[default]
    History,
    /// Keep only the most recent checkpoint
    KeepLast,
}

impl RetentionMode {
    /// Map the `history` configuration flag to a mode
    pub fn from_history_flag(history: bool) -> Self {
        if history {
            RetentionMode::History
        } else {
            RetentionMode::KeepLast
        }
    }
}

/// Creates, lists, restores and deletes checkpoints
#[derive(Clone)]
pub struct CheckpointManager {
    store: Arc<dyn DocumentStore>,
    entries: String,
    checkpoints: String,
    mode: RetentionMode,
}

impl CheckpointManager {
    /// Create a manager over the `entries` and `checkpoints` collections
    pub fn new(
        store: Arc<dyn DocumentStore>,
        entries: impl Into<String>,
        checkpoints: impl Into<String>,
        mode: RetentionMode,
    ) -> Self {
        Self {
            store,
            entries: entries.into(),
            checkpoints: checkpoints.into(),
            mode,
        }
    }

    /// Active retention mode
    pub fn mode(&self) -> RetentionMode {
        self.mode
    }

    /// Snapshot the entry at `path`
    pub async fn create(&self, path: &str) -> ContentsResult<CheckpointInfo> {
        let mut snapshot = self
            .store
            .find_one(&self.entries, doc! { fields::PATH: path }, None)
            .await?
            .ok_or_else(|| ContentsError::not_found("Entry", path))?;

        let entry_id = snapshot
            .remove(fields::ID)
            .ok_or_else(|| ContentsError::corrupted(path, "entry without store identity"))?;
        let checkpoint_id = self.next_id(path).await?;

        let filter = match self.mode {
            RetentionMode::History => {
                doc! { fields::PATH: path, fields::CHECKPOINT_ID: checkpoint_id.as_str() }
            }
            RetentionMode::KeepLast => {
                snapshot.insert(fields::CHECKPOINT_ID, checkpoint_id.as_str());
                doc! { fields::PATH: path, fields::ENTRY_ID: entry_id }
            }
        };

        let last_modified = snapshot
            .get_datetime(fields::LAST_MODIFIED)
            .map(|dt| dt.to_chrono())
            .map_err(|_| ContentsError::corrupted(path, "entry without lastModified"))?;

        self.store
            .update(&self.checkpoints, filter, snapshot, UpdateOptions::upsert())
            .await?;

        tracing::debug!(path, checkpoint_id = %checkpoint_id, mode = ?self.mode, "created checkpoint");

        Ok(CheckpointInfo {
            id: checkpoint_id,
            last_modified,
        })
    }

    /// Checkpoints for `path`, oldest first
    pub async fn list(&self, path: &str) -> ContentsResult<Vec<CheckpointInfo>> {
        let rows = self
            .store
            .find(
                &self.checkpoints,
                doc! { fields::PATH: path },
                Some(doc! { fields::CHECKPOINT_ID: 1, fields::LAST_MODIFIED: 1 }),
            )
            .await?;

        let mut infos = rows
            .iter()
            .map(|row| CheckpointInfo::from_document(path, row))
            .collect::<ContentsResult<Vec<_>>>()?;
        infos.sort_by(|a, b| {
            (a.sequence().is_none(), a.sequence(), &a.id)
                .cmp(&(b.sequence().is_none(), b.sequence(), &b.id))
        });
        Ok(infos)
    }

    /// Copy checkpoint `checkpoint_id` back onto the entry at `path`
    pub async fn restore(&self, checkpoint_id: &str, path: &str) -> ContentsResult<()> {
        let checkpoint = self.find(checkpoint_id, path).await?;

        let mut set = Document::new();
        for (key, value) in checkpoint {
            match key.as_str() {
                fields::ID
                | fields::CHECKPOINT_ID
                | fields::ENTRY_ID
                | fields::PATH
                | fields::PARENT
                | fields::NAME => {}
                _ => {
                    set.insert(key, value);
                }
            }
        }

        let outcome = self
            .store
            .update(
                &self.entries,
                doc! { fields::PATH: path },
                set,
                UpdateOptions::default(),
            )
            .await?;
        if outcome.matched == 0 {
            return Err(ContentsError::not_found("Entry", path));
        }

        tracing::debug!(path, checkpoint_id, "restored checkpoint");
        Ok(())
    }

    /// Remove one checkpoint
    pub async fn delete(&self, checkpoint_id: &str, path: &str) -> ContentsResult<()> {
        self.find(checkpoint_id, path).await?;
        self.store
            .remove(
                &self.checkpoints,
                doc! { fields::PATH: path, fields::CHECKPOINT_ID: checkpoint_id },
            )
            .await?;
        Ok(())
    }

    /// Remove every checkpoint at `path`
    pub async fn delete_all(&self, path: &str) -> ContentsResult<u64> {
        Ok(self
            .store
            .remove(&self.checkpoints, doc! { fields::PATH: path })
            .await?)
    }

    /// Move every checkpoint at `old_path` to `new_path`
    pub async fn rename_all(&self, old_path: &str, new_path: &str) -> ContentsResult<u64> {
        let outcome = self
            .store
            .update(
                &self.checkpoints,
                doc! { fields::PATH: old_path },
                doc! {
                    fields::PATH: new_path,
                    fields::NAME: new_path,
                    fields::PARENT: paths::parent_of(new_path),
                },
                UpdateOptions::multi(),
            )
            .await?;
        Ok(outcome.matched)
    }

    async fn find(&self, checkpoint_id: &str, path: &str) -> ContentsResult<Document> {
        self.store
            .find_one(
                &self.checkpoints,
                doc! { fields::PATH: path, fields::CHECKPOINT_ID: checkpoint_id },
                None,
            )
            .await?
            .ok_or_else(|| ContentsError::CheckpointNotFound {
                path: path.to_string(),
                checkpoint_id: checkpoint_id.to_string(),
            })
    }

    /// One past the highest numeric id stored for `path`
    async fn next_id(&self, path: &str) -> ContentsResult<String> {
        let rows = self
            .store
            .find(
                &self.checkpoints,
                doc! { fields::PATH: path },
                Some(doc! { fields::CHECKPOINT_ID: 1 }),
            )
            .await?;

        let next = rows
            .iter()
            .filter_map(|row| match row.get(fields::CHECKPOINT_ID) {
                Some(Bson::String(id)) => id.parse::<u64>().ok(),
                _ => None,
            })
            .max()
            .map(|max| max + 1)
            .unwrap_or(0);
        Ok(next.to_string())
    }
}
