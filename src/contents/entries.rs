//! Entry lifecycle: directories and notebooks addressed by path.

use bson::doc;
use chrono::Utc;
use std::sync::Arc;

use super::checkpoints::CheckpointManager;
use super::codec::{NotebookCodec, TrustPolicy};
use super::errors::{ContentsError, ContentsResult};
use super::index::PathIndex;
use super::models::{fields, Entry, EntryKind, Model, ModelContent, SaveModel};
use super::paths;
use crate::store::{DocumentStore, UpdateOptions};

/// Create, read, save, rename and delete entries
#[derive(Clone)]
pub struct EntryManager {
    store: Arc<dyn DocumentStore>,
    entries: String,
    index: PathIndex,
    checkpoints: CheckpointManager,
    codec: Arc<dyn NotebookCodec>,
    trust: Arc<dyn TrustPolicy>,
    owner: String,
}

impl EntryManager {
    /// Create a manager writing entries to the `entries` collection
    pub fn new(
        store: Arc<dyn DocumentStore>,
        entries: impl Into<String>,
        checkpoints: CheckpointManager,
        codec: Arc<dyn NotebookCodec>,
        trust: Arc<dyn TrustPolicy>,
        owner: impl Into<String>,
    ) -> Self {
        let entries = entries.into();
        Self {
            index: PathIndex::new(store.clone(), entries.clone()),
            store,
            entries,
            checkpoints,
            codec,
            trust,
            owner: owner.into(),
        }
    }

    /// Path lookups over the same collection
    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    /// Checkpoint manager used for cascades
    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Identity recorded on written entries
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Make sure the root directory exists
    pub async fn ensure_root(&self) -> ContentsResult<Model> {
        let root = SaveModel {
            name: Some(String::new()),
            path: Some(String::new()),
            writable: Some(true),
            ..SaveModel::directory()
        };
        self.ensure_directory(&root, "").await
    }

    /// Create a directory entry unless something already lives at `path`
    pub async fn ensure_directory(&self, model: &SaveModel, path: &str) -> ContentsResult<Model> {
        let now = Utc::now();
        let dir_path = model.path.clone().unwrap_or_else(|| path.to_string());
        let entry = Entry {
            id: None,
            name: model.name.clone().unwrap_or_else(|| dir_path.clone()),
            parent: paths::parent_of(&dir_path),
            path: dir_path,
            kind: EntryKind::Directory,
            content: None,
            owner: Some(self.owner.clone()),
            created: model.created.unwrap_or(now),
            last_modified: model.last_modified.unwrap_or(now),
            writable: model.writable.unwrap_or(false),
            mimetype: model.mimetype.clone().or_else(|| Some("directory".to_string())),
            format: model.format.clone(),
        };

        if !self.index.exists(&entry.path).await? {
            self.store
                .update(
                    &self.entries,
                    doc! { fields::PATH: entry.path.as_str() },
                    entry.to_set_document(),
                    UpdateOptions::upsert(),
                )
                .await?;
            tracing::debug!(path = %entry.path, "created directory");
        }

        Ok(entry.to_model())
    }

    /// Save a directory model; existing entries are left untouched
    pub async fn save_directory(&self, model: &SaveModel, path: &str) -> ContentsResult<Model> {
        self.ensure_directory(model, path).await
    }

    /// Load the directory at `path`, with its children when `with_content` is set
    pub async fn get_directory(&self, path: &str, with_content: bool) -> ContentsResult<Model> {
        let doc = self
            .store
            .find_one(
                &self.entries,
                doc! { fields::PATH: path, fields::TYPE: EntryKind::Directory.as_str() },
                None,
            )
            .await?
            .ok_or_else(|| ContentsError::not_found("Directory", path))?;
        let mut model = Entry::from_document(&doc)?.to_model();

        if with_content {
            let mut children = self.list_children(path, EntryKind::Notebook).await?;
            children.extend(self.list_children(path, EntryKind::Directory).await?);
            model.content = Some(ModelContent::Directory(children));
        }
        Ok(model)
    }

    /// Entries of `kind` directly under `path`, sorted case-insensitively
    async fn list_children(&self, path: &str, kind: EntryKind) -> ContentsResult<Vec<Model>> {
        let rows = self
            .store
            .find(
                &self.entries,
                doc! { fields::PARENT: path, fields::TYPE: kind.as_str() },
                Some(doc! { fields::CONTENT: 0 }),
            )
            .await?;

        let mut models = rows
            .iter()
            .map(|row| Entry::from_document(row).map(|e| e.to_model()))
            .collect::<ContentsResult<Vec<_>>>()?;
        models.sort_by_key(|m| paths::sort_key(&m.path));
        Ok(models)
    }

    /// Load the notebook at `path`, decoded and trust-marked when `with_content` is set
    pub async fn get_notebook(&self, path: &str, with_content: bool) -> ContentsResult<Model> {
        let projection = (!with_content).then(|| doc! { fields::CONTENT: 0 });
        let doc = self
            .store
            .find_one(
                &self.entries,
                doc! { fields::PATH: path, fields::TYPE: EntryKind::Notebook.as_str() },
                projection,
            )
            .await?
            .ok_or_else(|| ContentsError::not_found("Notebook", path))?;
        let entry = Entry::from_document(&doc)?;
        let mut model = entry.to_model();

        if with_content {
            let raw = entry
                .content
                .as_deref()
                .ok_or_else(|| ContentsError::corrupted(path, "notebook without content"))?;
            let mut nb = self.codec.reads(raw)?;
            self.trust.mark_trusted_cells(&mut nb, path)?;
            model.content = Some(ModelContent::Notebook(nb));
        }
        Ok(model)
    }

    /// Save a new notebook, synthesizing empty content when none is given
    pub async fn create_notebook(&self, model: SaveModel, path: &str) -> ContentsResult<Model> {
        let mut model = model;
        if model.content.is_none() {
            model.content = Some(self.codec.new_notebook());
        }
        model.path = Some(path.to_string());
        model.kind = Some(EntryKind::Notebook);
        self.save_notebook(&model, path).await
    }

    /// Write `model`'s content, renaming first when `model.path` differs from `path`.
    ///
    /// The first overwrite of a notebook without checkpoints snapshots it as
    /// checkpoint "0". Saving over a directory is a bad request, and a rename
    /// onto an occupied path is a conflict.
    pub async fn save_notebook(&self, model: &SaveModel, path: &str) -> ContentsResult<Model> {
        let content = model
            .content
            .as_ref()
            .ok_or_else(|| ContentsError::bad_request("No notebook JSON data provided"))?;

        let new_path = model.path.clone().unwrap_or_else(|| path.to_string());
        if self.index.directory_exists(&new_path).await? {
            return Err(ContentsError::bad_request(format!(
                "Cannot save a notebook over directory: {}",
                new_path
            )));
        }
        if new_path != path && self.index.exists(&new_path).await? {
            return Err(ContentsError::conflict(new_path));
        }

        // One checkpoint should always exist
        if self.index.notebook_exists(path).await?
            && self.checkpoints.list(path).await?.is_empty()
        {
            self.checkpoints.create(path).await?;
        }

        if new_path != path && self.index.exists(path).await? {
            self.rename(path, &new_path).await?;
        }

        self.write_notebook(model, content, &new_path)
            .await
            .map_err(|e| ContentsError::internal(new_path.as_str(), e))?;

        self.get_notebook(&new_path, false).await
    }

    async fn write_notebook(
        &self,
        model: &SaveModel,
        content: &serde_json::Value,
        path: &str,
    ) -> ContentsResult<()> {
        let raw = self.codec.writes(content)?;
        self.trust.check_and_sign(content, path)?;

        let now = bson::DateTime::from_chrono(Utc::now());
        let created = model
            .created
            .map(bson::DateTime::from_chrono)
            .unwrap_or(now);
        let set = doc! {
            fields::NAME: model.name.clone().unwrap_or_else(|| path.to_string()),
            fields::PARENT: paths::parent_of(path),
            fields::TYPE: EntryKind::Notebook.as_str(),
            fields::CONTENT: raw,
            fields::LAST_MODIFIED: now,
            fields::OWNER: self.owner.as_str(),
            fields::CREATED: created,
        };

        self.store
            .update(
                &self.entries,
                doc! { fields::PATH: path },
                set,
                UpdateOptions::upsert(),
            )
            .await?;
        tracing::debug!(path, "saved notebook");
        Ok(())
    }

    /// Apply a rename carried by `model` without touching content
    pub async fn update_notebook(&self, model: &SaveModel, path: &str) -> ContentsResult<Model> {
        let new_path = model.path.clone().unwrap_or_else(|| path.to_string());
        if new_path != path {
            self.rename(path, &new_path).await?;
        }
        self.get_notebook(&new_path, false).await
    }

    /// Remove the entry at `path` and its checkpoints
    pub async fn delete_entry(&self, path: &str) -> ContentsResult<()> {
        if path.is_empty() {
            return Err(ContentsError::bad_request("Cannot delete the root directory"));
        }

        let doc = self
            .store
            .find_one(
                &self.entries,
                doc! { fields::PATH: path },
                Some(doc! { fields::PATH: 1, fields::TYPE: 1 }),
            )
            .await?
            .ok_or_else(|| ContentsError::not_found("Entry", path))?;

        if doc.get_str(fields::TYPE).ok() == Some(EntryKind::Directory.as_str())
            && self.has_children(path).await?
        {
            return Err(ContentsError::bad_request(format!(
                "Directory not empty: {}",
                path
            )));
        }

        // Not transactional: a failure here leaves orphaned checkpoints only
        let removed = self.checkpoints.delete_all(path).await?;
        self.store
            .remove(&self.entries, doc! { fields::PATH: path })
            .await?;
        tracing::debug!(path, checkpoints = removed, "deleted entry");
        Ok(())
    }

    /// Whether any entry lists `path` as its parent
    async fn has_children(&self, path: &str) -> ContentsResult<bool> {
        let children = self
            .store
            .count(&self.entries, doc! { fields::PARENT: path })
            .await?;
        Ok(children > 0)
    }

    /// Move the entry at `old_path` to `new_path`, checkpoints included
    pub async fn rename(&self, old_path: &str, new_path: &str) -> ContentsResult<()> {
        if old_path == new_path {
            return Ok(());
        }
        if old_path.is_empty() {
            return Err(ContentsError::bad_request("Cannot rename the root directory"));
        }

        if self.index.exists(new_path).await? {
            return Err(ContentsError::conflict(new_path));
        }

        // Children are addressed by full path; moving them is not supported
        if self.has_children(old_path).await? {
            return Err(ContentsError::bad_request(format!(
                "Directory not empty: {}",
                old_path
            )));
        }

        let outcome = self
            .store
            .update(
                &self.entries,
                doc! { fields::PATH: old_path },
                doc! {
                    fields::PATH: new_path,
                    fields::NAME: new_path,
                    fields::PARENT: paths::parent_of(new_path),
                },
                UpdateOptions::default(),
            )
            .await
            .map_err(|e| ContentsError::internal(old_path, e))?;
        if outcome.matched == 0 {
            return Err(ContentsError::not_found("Entry", old_path));
        }

        if let Err(e) = self.checkpoints.rename_all(old_path, new_path).await {
            tracing::warn!(old_path, new_path, error = %e, "failed to move checkpoints");
        }
        Ok(())
    }
}
