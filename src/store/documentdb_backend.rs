//! DocumentDB/MongoDB Document Store
//!
//! Production backend speaking the MongoDB wire protocol through the
//! official driver. Connection pooling, reconnects and retryable writes are
//! the driver's business; this type only maps the collection contract.
//!
//! ## Usage
//!
//! Enable the `storage-documentdb` feature in Cargo.toml:
//!
//! ```toml
//! nbvault = { version = "0.3", features = ["storage-documentdb"] }
//! ```
//!
//! ```rust,no_run
//! use nbvault::store::DocumentDbStore;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let store = DocumentDbStore::connect("mongodb://localhost:27017/", None, "ipython").await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{bson::doc, bson::Document, options::ClientOptions, Client, Collection, Database};

use super::traits::{DocumentStore, StoreError, StoreResult, UpdateOptions, UpdateOutcome};

/// DocumentDB/MongoDB document store
pub struct DocumentDbStore {
    client: Client,
    database: Database,
}

impl DocumentDbStore {
    /// Connect to a MongoDB/DocumentDB deployment
    ///
    /// # Arguments
    /// * `connection_string` - MongoDB/DocumentDB connection string
    /// * `replica_set` - Replica set name, if the deployment uses one
    /// * `database` - Database holding the entry and checkpoint collections
    pub async fn connect(
        connection_string: &str,
        replica_set: Option<&str>,
        database: &str,
    ) -> StoreResult<Self> {
        let mut client_options = ClientOptions::parse(connection_string)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if let Some(name) = replica_set {
            client_options.repl_set_name = Some(name.to_string());
        }

        let client =
            Client::with_options(client_options).map_err(|e| StoreError::Connection(e.to_string()))?;
        let database = client.database(database);

        tracing::debug!(database = database.name(), "connected document store");

        Ok(Self { client, database })
    }

    /// Get the MongoDB client (for advanced operations)
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

fn backend_error(e: mongodb::error::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl DocumentStore for DocumentDbStore {
    fn backend_type(&self) -> &'static str {
        "mongodb"
    }

    async fn is_available(&self) -> bool {
        self.database.run_command(doc! { "ping": 1 }).await.is_ok()
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> StoreResult<Option<Document>> {
        let coll = self.collection(collection);
        match projection {
            Some(p) => coll.find_one(filter).projection(p).await,
            None => coll.find_one(filter).await,
        }
        .map_err(backend_error)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> StoreResult<Vec<Document>> {
        let coll = self.collection(collection);
        let cursor = match projection {
            Some(p) => coll.find(filter).projection(p).await,
            None => coll.find(filter).await,
        }
        .map_err(backend_error)?;

        cursor.try_collect().await.map_err(backend_error)
    }

    async fn count(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        self.collection(collection)
            .count_documents(filter)
            .await
            .map_err(backend_error)
    }

    async fn update(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
        options: UpdateOptions,
    ) -> StoreResult<UpdateOutcome> {
        let coll = self.collection(collection);
        let update = doc! { "$set": set };

        let result = if options.multi {
            coll.update_many(filter, update)
                .upsert(options.upsert)
                .await
        } else {
            coll.update_one(filter, update).upsert(options.upsert).await
        }
        .map_err(backend_error)?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn remove(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        let result = self
            .collection(collection)
            .delete_many(filter)
            .await
            .map_err(backend_error)?;

        Ok(result.deleted_count)
    }
}
