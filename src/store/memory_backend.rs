//! In-Memory Document Store
//!
//! Keeps collections as insertion-ordered vectors of documents. Used by the
//! test suite and by hosts that embed the contents layer without a database.

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::traits::{DocumentStore, StoreError, StoreResult, UpdateOptions, UpdateOutcome};

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `collection`
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Whether `collection` holds no documents
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

fn check_filter(filter: &Document) -> StoreResult<()> {
    for (key, value) in filter {
        if key.starts_with('$') {
            return Err(StoreError::UnsupportedFilter(key.clone()));
        }
        if let Bson::Document(inner) = value {
            if let Some(op) = inner.keys().find(|k| k.starts_with('$')) {
                return Err(StoreError::UnsupportedFilter(format!("{}.{}", key, op)));
            }
        }
    }
    Ok(())
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| match (doc.get(key), expected) {
        (None, Bson::Null) => true,
        (Some(actual), expected) => actual == expected,
        (None, _) => false,
    })
}

/// Apply a projection. Any truthy value makes it an inclusion projection
/// (plus `_id`); otherwise the listed fields are excluded.
fn project(doc: &Document, projection: Option<&Document>) -> Document {
    let Some(projection) = projection else {
        return doc.clone();
    };

    let truthy = |v: &Bson| match v {
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Boolean(b) => *b,
        _ => true,
    };
    let inclusive = projection.values().any(truthy);

    let mut out = Document::new();
    for (key, value) in doc {
        let listed = projection.get(key);
        let keep = if inclusive {
            key == "_id" || listed.map(truthy).unwrap_or(false)
        } else {
            listed.is_none()
        };
        if keep {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> StoreResult<Option<Document>> {
        check_filter(&filter)?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|doc| matches(doc, &filter))
                .map(|doc| project(doc, projection.as_ref()))
        }))
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> StoreResult<Vec<Document>> {
        check_filter(&filter)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| matches(doc, &filter))
                    .map(|doc| project(doc, projection.as_ref()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        check_filter(&filter)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| matches(doc, &filter)).count() as u64)
            .unwrap_or(0))
    }

    async fn update(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
        options: UpdateOptions,
    ) -> StoreResult<UpdateOutcome> {
        check_filter(&filter)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let mut matched = 0;
        for doc in docs.iter_mut().filter(|doc| matches(doc, &filter)) {
            for (key, value) in &set {
                doc.insert(key.clone(), value.clone());
            }
            matched += 1;
            if !options.multi {
                break;
            }
        }

        if matched > 0 || !options.upsert {
            return Ok(UpdateOutcome {
                matched,
                upserted_id: None,
            });
        }

        let mut inserted = Document::new();
        let id = match filter.get("_id").or_else(|| set.get("_id")) {
            Some(id) => id.clone(),
            None => Bson::ObjectId(ObjectId::new()),
        };
        inserted.insert("_id", id.clone());
        for (key, value) in filter.into_iter().chain(set) {
            inserted.insert(key, value);
        }
        docs.push(inserted);

        Ok(UpdateOutcome {
            matched: 0,
            upserted_id: Some(id),
        })
    }

    async fn remove(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        check_filter(&filter)?;
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !matches(doc, &filter));
        Ok((before - docs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn test_upsert_inserts_filter_and_set_fields() {
        let store = MemoryDocumentStore::new();
        let outcome = store
            .update(
                "c",
                doc! { "path": "a", "name": "a" },
                doc! { "type": "directory" },
                UpdateOptions::upsert(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.matched, 0);
        assert!(matches!(outcome.upserted_id, Some(Bson::ObjectId(_))));

        let doc = store.find_one("c", doc! { "path": "a" }, None).await.unwrap().unwrap();
        assert_eq!(doc.get_str("name").unwrap(), "a");
        assert_eq!(doc.get_str("type").unwrap(), "directory");
        assert!(doc.get_object_id("_id").is_ok());
    }

    #[tokio::test]
    async fn test_update_without_upsert_matches_nothing() {
        let store = MemoryDocumentStore::new();
        let outcome = store
            .update("c", doc! { "path": "x" }, doc! { "a": 1 }, UpdateOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::default());
        assert!(store.is_empty("c").await);
    }

    #[tokio::test]
    async fn test_multi_update_touches_every_match() {
        let store = MemoryDocumentStore::new();
        for cp in ["0", "1", "2"] {
            store
                .update("c", doc! { "path": "a", "cp": cp }, doc! {}, UpdateOptions::upsert())
                .await
                .unwrap();
        }

        let single = store
            .update("c", doc! { "path": "a" }, doc! { "tag": 1 }, UpdateOptions::default())
            .await
            .unwrap();
        assert_eq!(single.matched, 1);

        let multi = store
            .update("c", doc! { "path": "a" }, doc! { "path": "b" }, UpdateOptions::multi())
            .await
            .unwrap();
        assert_eq!(multi.matched, 3);
        assert_eq!(store.count("c", doc! { "path": "b" }).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_null_filter_matches_missing_field() {
        let store = MemoryDocumentStore::new();
        store
            .update("c", doc! { "path": "" }, doc! {}, UpdateOptions::upsert())
            .await
            .unwrap();
        let found = store
            .find("c", doc! { "parent": Bson::Null }, None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_projection_include_and_exclude() {
        let store = MemoryDocumentStore::new();
        store
            .update(
                "c",
                doc! { "path": "n.ipynb" },
                doc! { "content": "{}", "type": "notebook" },
                UpdateOptions::upsert(),
            )
            .await
            .unwrap();

        let excluded = store
            .find_one("c", doc! {}, Some(doc! { "content": 0 }))
            .await
            .unwrap()
            .unwrap();
        assert!(!excluded.contains_key("content"));
        assert!(excluded.contains_key("type"));

        let included = store
            .find_one("c", doc! {}, Some(doc! { "path": 1 }))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(included.len(), 2);
        assert!(included.contains_key("_id"));
        assert!(included.contains_key("path"));
    }

    #[tokio::test]
    async fn test_remove_returns_count() {
        let store = MemoryDocumentStore::new();
        for cp in ["0", "1"] {
            store
                .update("c", doc! { "path": "a", "cp": cp }, doc! {}, UpdateOptions::upsert())
                .await
                .unwrap();
        }
        assert_eq!(store.remove("c", doc! { "path": "a" }).await.unwrap(), 2);
        assert_eq!(store.remove("missing", doc! {}).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_operator_filters_rejected() {
        let store = MemoryDocumentStore::new();
        let result = store
            .find("c", doc! { "path": { "$regex": "^a" } }, None)
            .await;
        assert!(matches!(result, Err(StoreError::UnsupportedFilter(_))));
    }
}
