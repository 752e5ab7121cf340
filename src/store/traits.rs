//! Document Store Traits
//!
//! Defines the collection-level contract every backend implements.

use async_trait::async_trait;
use bson::Document;
use std::collections::HashMap;
use std::sync::Arc;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection error (for remote backends)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Filter uses an operator the backend cannot evaluate
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Generic backend error
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Options for [`DocumentStore::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert a new document when nothing matches the filter
    pub upsert: bool,
    /// Update every matching document instead of the first one
    pub multi: bool,
}

impl UpdateOptions {
    /// Update-or-insert a single document
    pub fn upsert() -> Self {
        Self {
            upsert: true,
            multi: false,
        }
    }

    /// Update every matching document, never insert
    pub fn multi() -> Self {
        Self {
            upsert: false,
            multi: true,
        }
    }
}

/// Outcome of an update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    /// Number of documents matched by the filter
    pub matched: u64,
    /// Identity of the inserted document, when the update upserted
    pub upserted_id: Option<bson::Bson>,
}

/// Core trait for document stores
///
/// Filters are equality matches on top-level fields; a `null` filter value
/// also matches a missing field. Updates are `$set` semantics: the fields
/// of `set` are merged into every matched document, and an upsert inserts
/// the filter's fields together with `set`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get the backend type name (e.g., "memory", "mongodb")
    fn backend_type(&self) -> &'static str;

    /// Check if the backend is available/connected
    async fn is_available(&self) -> bool;

    /// Find the first document matching `filter`
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> StoreResult<Option<Document>>;

    /// Find every document matching `filter`, in storage order
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> StoreResult<Vec<Document>>;

    /// Count documents matching `filter`
    async fn count(&self, collection: &str, filter: Document) -> StoreResult<u64>;

    /// Apply `$set` of `set` to documents matching `filter`
    async fn update(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
        options: UpdateOptions,
    ) -> StoreResult<UpdateOutcome>;

    /// Remove every document matching `filter`, returning how many went
    async fn remove(&self, collection: &str, filter: Document) -> StoreResult<u64>;
}

/// Builder for creating document stores from configuration
pub struct StoreBuilder {
    backend_type: String,
    config: HashMap<String, String>,
}

impl StoreBuilder {
    /// Create a new builder
    pub fn new(backend_type: &str) -> Self {
        Self {
            backend_type: backend_type.to_string(),
            config: HashMap::new(),
        }
    }

    /// Add a configuration option
    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the connection string (for remote backends)
    pub fn with_uri(self, uri: &str) -> Self {
        self.with_option("uri", uri)
    }

    /// Set the replica set name; an empty name means no replica set
    pub fn with_replica_set(self, replica_set: &str) -> Self {
        self.with_option("replica_set", replica_set)
    }

    /// Set the database name (for remote backends)
    pub fn with_database(self, database: &str) -> Self {
        self.with_option("database", database)
    }

    /// Build the document store
    pub async fn build(self) -> StoreResult<Arc<dyn DocumentStore>> {
        match self.backend_type.as_str() {
            "memory" => Ok(Arc::new(super::MemoryDocumentStore::new())),
            #[cfg(feature = "storage-documentdb")]
            "documentdb" | "mongodb" => {
                let uri = self
                    .config
                    .get("uri")
                    .ok_or_else(|| StoreError::Configuration("uri is required".into()))?;
                let database = self
                    .config
                    .get("database")
                    .ok_or_else(|| StoreError::Configuration("database is required".into()))?;
                let replica_set = self
                    .config
                    .get("replica_set")
                    .map(String::as_str)
                    .filter(|name| !name.is_empty());
                let store = super::DocumentDbStore::connect(uri, replica_set, database).await?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "storage-documentdb"))]
            "documentdb" | "mongodb" => Err(StoreError::Configuration(
                "DocumentDB backend requires the storage-documentdb feature".into(),
            )),
            unknown => Err(StoreError::Configuration(format!(
                "Unknown backend type: {}",
                unknown
            ))),
        }
    }
}
