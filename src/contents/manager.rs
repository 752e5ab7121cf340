//! Host-facing facade over entries and checkpoints.

use std::sync::Arc;

use super::checkpoints::{CheckpointManager, RetentionMode};
use super::codec::{JsonNotebookCodec, NoopTrustPolicy, NotebookCodec, TrustPolicy};
use super::entries::EntryManager;
use super::errors::ContentsResult;
use super::models::{CheckpointInfo, EntryKind, Model, SaveModel};
use super::paths;
use crate::observability::Logger;
use crate::store::DocumentStore;

/// Uniform get/save/delete/rename surface dispatching on [`EntryKind`].
///
/// Domain errors (not found, conflict, bad request) reach the host as they
/// are. Store, codec and decoding failures from `get`, `save` and `update`
/// are reported as [`ContentsError::Internal`](super::ContentsError::Internal)
/// tagged with the path.
#[derive(Clone)]
pub struct ContentsManager {
    entries: EntryManager,
    backend: &'static str,
    logger: Option<Arc<Logger>>,
}

/// Builder for [`ContentsManager`]
pub struct ContentsManagerBuilder {
    store: Arc<dyn DocumentStore>,
    entries_collection: String,
    checkpoints_collection: String,
    retention: RetentionMode,
    owner: String,
    codec: Arc<dyn NotebookCodec>,
    trust: Arc<dyn TrustPolicy>,
    logger: Option<Arc<Logger>>,
}

impl ContentsManagerBuilder {
    /// Start from the default collections, retention and codec
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            entries_collection: "notebooks".to_string(),
            checkpoints_collection: "checkpoints".to_string(),
            retention: RetentionMode::History,
            owner: "unknown".to_string(),
            codec: Arc::new(JsonNotebookCodec),
            trust: Arc::new(NoopTrustPolicy),
            logger: None,
        }
    }

    /// Collection names for entries and checkpoints
    pub fn collections(mut self, entries: &str, checkpoints: &str) -> Self {
        self.entries_collection = entries.to_string();
        self.checkpoints_collection = checkpoints.to_string();
        self
    }

    /// Checkpoint retention mode
    pub fn retention(mut self, retention: RetentionMode) -> Self {
        self.retention = retention;
        self
    }

    /// Identity recorded on written entries
    pub fn owner(mut self, owner: &str) -> Self {
        self.owner = owner.to_string();
        self
    }

    /// Replace the JSON notebook codec
    pub fn codec(mut self, codec: Arc<dyn NotebookCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the no-op trust policy
    pub fn trust(mut self, trust: Arc<dyn TrustPolicy>) -> Self {
        self.trust = trust;
        self
    }

    /// Attach a markdown activity log
    pub fn logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Build the manager and make sure the root directory exists
    pub async fn build(self) -> ContentsResult<ContentsManager> {
        let checkpoints = CheckpointManager::new(
            self.store.clone(),
            self.entries_collection.clone(),
            self.checkpoints_collection,
            self.retention,
        );
        let backend = self.store.backend_type();
        let entries = EntryManager::new(
            self.store,
            self.entries_collection,
            checkpoints,
            self.codec,
            self.trust,
            self.owner,
        );
        entries.ensure_root().await?;

        Ok(ContentsManager {
            entries,
            backend,
            logger: self.logger,
        })
    }
}

impl ContentsManager {
    /// Start building a manager over `store`
    pub fn builder(store: Arc<dyn DocumentStore>) -> ContentsManagerBuilder {
        ContentsManagerBuilder::new(store)
    }

    /// Connect the configured store and build a manager on top of it
    #[cfg(feature = "config")]
    pub async fn from_config(config: &crate::config::Configuration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let store = crate::store::StoreBuilder::new(&config.store.backend)
            .with_uri(&config.store.uri)
            .with_replica_set(&config.store.replica_set)
            .with_database(&config.store.database_name)
            .build()
            .await
            .with_context(|| format!("Failed to open {} store", config.store.backend))?;

        let mut builder = Self::builder(store)
            .collections(
                &config.store.entries_collection,
                &config.store.checkpoints_collection,
            )
            .retention(config.checkpoints.retention());
        if let Some(owner) = &config.contents.owner {
            builder = builder.owner(owner);
        }
        if let Some(log_file) = &config.logging.log_file {
            let logger = Logger::new(
                Some(std::path::Path::new(log_file)),
                Some(config.logging.log_level.as_str()),
            )?;
            builder = builder.logger(Arc::new(logger));
        }

        builder.build().await.context("Failed to initialize contents root")
    }

    /// Lower-level entry operations
    pub fn entries(&self) -> &EntryManager {
        &self.entries
    }

    /// Fetch the model at `path`, inferring its kind when not given
    pub async fn get(
        &self,
        path: &str,
        kind: Option<EntryKind>,
        with_content: bool,
    ) -> ContentsResult<Model> {
        let path = paths::normalize(path);
        let result = async {
            let kind = match kind {
                Some(kind) => kind,
                None => self.guess_type(&path).await?,
            };
            match kind {
                EntryKind::Directory => self.entries.get_directory(&path, with_content).await,
                EntryKind::Notebook | EntryKind::File => {
                    self.entries.get_notebook(&path, with_content).await
                }
            }
        }
        .await
        .map_err(|e| e.at_path(&path));

        self.record("get", &path, &result);
        result
    }

    /// Write `model` at `path`; the model's kind wins over inference
    pub async fn save(&self, model: SaveModel, path: &str) -> ContentsResult<Model> {
        let path = paths::normalize(path);
        let mut model = model;
        model.path = model.path.map(|p| paths::normalize(&p));

        let result = async {
            let kind = match model.kind {
                Some(kind) => kind,
                None => self.guess_type(&path).await?,
            };
            match kind {
                EntryKind::Directory => self.entries.save_directory(&model, &path).await,
                EntryKind::Notebook | EntryKind::File => {
                    self.entries.save_notebook(&model, &path).await
                }
            }
        }
        .await
        .map_err(|e| e.at_path(&path));

        self.record("save", &path, &result);
        result
    }

    /// Rename-only update; content in `model` is ignored
    pub async fn update(&self, model: SaveModel, path: &str) -> ContentsResult<Model> {
        let path = paths::normalize(path);
        let mut model = model;
        model.path = model.path.map(|p| paths::normalize(&p));

        let result = self
            .entries
            .update_notebook(&model, &path)
            .await
            .map_err(|e| e.at_path(&path));
        self.record("update", &path, &result);
        result
    }

    /// Create an empty notebook at `path`
    pub async fn new_notebook(&self, path: &str) -> ContentsResult<Model> {
        let path = paths::normalize(path);
        let result = self.entries.create_notebook(SaveModel::default(), &path).await;
        self.record("new notebook", &path, &result);
        result
    }

    /// Create a directory at `path`
    pub async fn new_directory(&self, path: &str) -> ContentsResult<Model> {
        let path = paths::normalize(path);
        let result = self
            .entries
            .ensure_directory(&SaveModel::directory(), &path)
            .await;
        self.record("new directory", &path, &result);
        result
    }

    /// Delete the entry at `path` together with its checkpoints
    pub async fn delete_file(&self, path: &str) -> ContentsResult<()> {
        let path = paths::normalize(path);
        let result = self.entries.delete_entry(&path).await;
        self.record("delete", &path, &result);
        result
    }

    /// Move the entry at `old_path` to `new_path`
    pub async fn rename_file(&self, old_path: &str, new_path: &str) -> ContentsResult<()> {
        let old_path = paths::normalize(old_path);
        let new_path = paths::normalize(new_path);
        let result = self.entries.rename(&old_path, &new_path).await;
        self.record("rename", &old_path, &result);
        result
    }

    /// Whether a notebook lives at `path`
    pub async fn file_exists(&self, path: &str) -> ContentsResult<bool> {
        self.entries
            .index()
            .notebook_exists(&paths::normalize(path))
            .await
    }

    /// Whether anything lives at `path`
    pub async fn dir_exists(&self, path: &str) -> ContentsResult<bool> {
        self.entries.index().exists(&paths::normalize(path)).await
    }

    /// Whether a notebook or directory lives at `path`
    pub async fn exists(&self, path: &str) -> ContentsResult<bool> {
        let path = paths::normalize(path);
        Ok(self.file_exists(&path).await? || self.dir_exists(&path).await?)
    }

    /// Nothing stored in the database is hidden
    pub fn is_hidden(&self, _path: &str) -> bool {
        false
    }

    /// Human-readable description of the backing store
    pub fn info_string(&self) -> String {
        format!("Serving notebooks from {}", self.backend)
    }

    /// Kind of `path`, inferred from its suffix and the store
    pub async fn guess_type(&self, path: &str) -> ContentsResult<EntryKind> {
        self.entries.index().type_of(&paths::normalize(path)).await
    }

    /// Snapshot the entry at `path`
    pub async fn create_checkpoint(&self, path: &str) -> ContentsResult<CheckpointInfo> {
        let path = paths::normalize(path);
        let result = self.entries.checkpoints().create(&path).await;
        if let (Some(logger), Ok(info)) = (&self.logger, &result) {
            self.log_result(logger.log_checkpoint("created", &path, &info.id));
        }
        self.record("create checkpoint", &path, &result);
        result
    }

    /// Checkpoints of `path`, oldest first
    pub async fn list_checkpoints(&self, path: &str) -> ContentsResult<Vec<CheckpointInfo>> {
        self.entries
            .checkpoints()
            .list(&paths::normalize(path))
            .await
    }

    /// Copy a checkpoint back onto the entry at `path`
    pub async fn restore_checkpoint(&self, checkpoint_id: &str, path: &str) -> ContentsResult<()> {
        let path = paths::normalize(path);
        let result = self.entries.checkpoints().restore(checkpoint_id, &path).await;
        if let (Some(logger), Ok(())) = (&self.logger, &result) {
            self.log_result(logger.log_checkpoint("restored", &path, checkpoint_id));
        }
        self.record("restore checkpoint", &path, &result);
        result
    }

    /// Remove one checkpoint of `path`
    pub async fn delete_checkpoint(&self, checkpoint_id: &str, path: &str) -> ContentsResult<()> {
        let path = paths::normalize(path);
        let result = self.entries.checkpoints().delete(checkpoint_id, &path).await;
        if let (Some(logger), Ok(())) = (&self.logger, &result) {
            self.log_result(logger.log_checkpoint("deleted", &path, checkpoint_id));
        }
        self.record("delete checkpoint", &path, &result);
        result
    }

    fn record<T>(&self, operation: &str, path: &str, result: &ContentsResult<T>) {
        let Some(logger) = &self.logger else {
            return;
        };
        let written = match result {
            Ok(_) => logger.log_operation(operation, path),
            Err(e) => logger.log_error(operation, path, &e.to_string()),
        };
        self.log_result(written);
    }

    fn log_result(&self, written: anyhow::Result<()>) {
        if let Err(e) = written {
            tracing::warn!(error = %e, "failed to write activity log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contents::ContentsError;
    use crate::store::MemoryDocumentStore;
    use serde_json::json;

    async fn manager() -> ContentsManager {
        ContentsManager::builder(Arc::new(MemoryDocumentStore::new()))
            .owner("bob")
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_exists_after_build() {
        let contents = manager().await;
        let root = contents.get("/", None, true).await.unwrap();
        assert_eq!(root.kind, EntryKind::Directory);
        assert!(root.writable);
        assert_eq!(root.children().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_get_dispatches_on_kind() {
        let contents = manager().await;
        contents.new_directory("d").await.unwrap();
        contents
            .save(SaveModel::notebook(json!({ "cells": [] })), "d/n.ipynb")
            .await
            .unwrap();

        let nb = contents.get("d/n.ipynb", None, true).await.unwrap();
        assert_eq!(nb.kind, EntryKind::Notebook);
        assert_eq!(nb.owner.as_deref(), Some("bob"));

        let dir = contents.get("d", None, false).await.unwrap();
        assert_eq!(dir.kind, EntryKind::Directory);

        let as_file = contents.get("d/n.ipynb", Some(EntryKind::File), false).await.unwrap();
        assert_eq!(as_file.path, "d/n.ipynb");
    }

    #[tokio::test]
    async fn test_not_found_is_not_flattened() {
        let contents = manager().await;
        let err = contents.get("missing.ipynb", None, true).await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        let err = contents
            .get("nothing", Some(EntryKind::Directory), true)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_save_without_kind_infers_from_path() {
        let contents = manager().await;
        let model = SaveModel {
            content: Some(json!({})),
            ..Default::default()
        };
        let saved = contents.save(model, "inferred.ipynb").await.unwrap();
        assert_eq!(saved.kind, EntryKind::Notebook);

        let saved = contents.save(SaveModel::directory(), "/newdir/").await.unwrap();
        assert_eq!(saved.path, "newdir");
        assert!(contents.dir_exists("newdir").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_bad_request_propagates() {
        let contents = manager().await;
        let err = contents
            .save(SaveModel { kind: Some(EntryKind::Notebook), ..Default::default() }, "x.ipynb")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentsError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_root_survives_rename_and_save() {
        let contents = manager().await;

        let err = contents.rename_file("/", "hijacked").await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = contents
            .save(SaveModel::notebook(json!({ "v": 1 })), "/")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let root = contents.get("", None, false).await.unwrap();
        assert_eq!(root.kind, EntryKind::Directory);
        assert!(!contents.exists("hijacked").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_and_info() {
        let contents = manager().await;
        contents.new_notebook("a.ipynb").await.unwrap();
        assert!(contents.file_exists("a.ipynb").await.unwrap());
        assert!(contents.exists("/a.ipynb").await.unwrap());
        assert!(!contents.exists("b.ipynb").await.unwrap());
        assert!(!contents.is_hidden(".secret"));
        assert_eq!(contents.info_string(), "Serving notebooks from memory");
    }

    #[tokio::test]
    async fn test_activity_log_records_checkpoints() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("activity.md");
        let logger = Arc::new(Logger::new(Some(&log_path), None).unwrap());

        let contents = ContentsManager::builder(Arc::new(MemoryDocumentStore::new()))
            .logger(logger)
            .build()
            .await
            .unwrap();
        contents.new_notebook("a.ipynb").await.unwrap();
        contents.create_checkpoint("a.ipynb").await.unwrap();
        let _ = contents.delete_file("ghost.ipynb").await;

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("### Checkpoint created"));
        assert!(log.contains("**Operation:** delete"));
    }

    #[cfg(feature = "config")]
    #[tokio::test]
    async fn test_from_config_memory_backend() {
        let mut config = crate::config::Configuration::default();
        config.store.backend = "memory".to_string();
        config.checkpoints.history = false;
        config.contents.owner = Some("dana".to_string());

        let contents = ContentsManager::from_config(&config).await.unwrap();
        assert_eq!(contents.entries().owner(), "dana");
        assert_eq!(contents.entries().checkpoints().mode(), RetentionMode::KeepLast);
        assert!(contents.dir_exists("").await.unwrap());
    }
}
