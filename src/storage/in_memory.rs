//! In-memory implementation of CollectionAccessor for testing and development

use crate::core::filter::{ID_ALIAS, ID_FIELD};
use crate::core::{CollectionAccessor, Filter, Patch};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

type Collections = HashMap<String, IndexMap<String, Value>>;

/// In-memory document store
///
/// Documents are JSON objects keyed by their `id` field, kept in insertion
/// order per collection. Uses RwLock for thread-safe access; clones share
/// the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document, assigning a UUID `id` when it has none
    ///
    /// A given identifier keeps its JSON type, so references holding the
    /// same value still match it. Returns the stored document.
    pub fn insert(&self, collection: &str, mut doc: Value) -> Result<Value> {
        let map = doc
            .as_object_mut()
            .ok_or_else(|| anyhow!("Documents must be JSON objects"))?;

        let id = match map.remove(ID_FIELD).or_else(|| map.remove(ID_ALIAS)) {
            Some(Value::Null) | None => Value::String(Uuid::new_v4().to_string()),
            Some(given) => given,
        };
        let key = key_of(&id);
        map.insert(ID_ALIAS.to_string(), id);

        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key, doc.clone());

        Ok(doc)
    }

    /// Insert several documents, returning how many were stored
    pub fn insert_many(&self, collection: &str, docs: Vec<Value>) -> Result<usize> {
        let mut inserted = 0;
        for doc in docs {
            self.insert(collection, doc)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Get a document by identifier
    pub fn get(&self, collection: &str, id: &Value) -> Result<Option<Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(&key_of(id)))
            .cloned())
    }

    /// List documents matching `filter`, in insertion order
    pub fn list(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(collections
            .get(collection)
            .map(|docs| docs.values().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> Result<usize> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(collections.get(collection).map_or(0, IndexMap::len))
    }

    /// Whether a collection holds no documents
    pub fn is_empty(&self, collection: &str) -> Result<bool> {
        Ok(self.len(collection)? == 0)
    }
}

fn key_of(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl CollectionAccessor for InMemoryStore {
    async fn find_ids(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(key, doc)| {
                        doc.get(ID_ALIAS)
                            .cloned()
                            .unwrap_or_else(|| Value::String(key.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(collections.get(collection).map_or(0, |docs| {
            docs.values().filter(|doc| filter.matches(doc)).count() as u64
        }))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|_, doc| !filter.matches(doc));

        Ok((before - docs.len()) as u64)
    }

    async fn update_many(&self, collection: &str, filter: &Filter, patch: &Patch) -> Result<u64> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let mut updated = 0;
        for doc in docs.values_mut().filter(|doc| filter.matches(doc)) {
            patch.apply_to(doc);
            updated += 1;
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Lifecycle;
    use serde_json::json;

    #[test]
    fn test_insert_assigns_id() {
        let store = InMemoryStore::new();
        let doc = store.insert("user", json!({"name": "Alice"})).unwrap();

        let id = doc["id"].as_str().unwrap();
        Uuid::parse_str(id).unwrap();
        assert_eq!(store.get("user", &json!(id)).unwrap().unwrap()["name"], "Alice");
    }

    #[test]
    fn test_insert_keeps_given_id() {
        let store = InMemoryStore::new();
        store.insert("user", json!({"_id": "u1"})).unwrap();

        let doc = store.get("user", &json!("u1")).unwrap().unwrap();
        assert_eq!(doc, json!({"id": "u1"}));
    }

    #[tokio::test]
    async fn test_numeric_ids_keep_their_type() {
        let store = InMemoryStore::new();
        let doc = store.insert("space", json!({"id": 7})).unwrap();
        assert_eq!(doc, json!({"id": 7}));

        let ids = store.find_ids("space", &Filter::by_id(7)).await.unwrap();
        assert_eq!(ids, vec![json!(7)]);
        assert!(store.get("space", &json!(7)).unwrap().is_some());
    }

    #[test]
    fn test_insert_rejects_non_object() {
        let store = InMemoryStore::new();
        assert!(store.insert("user", json!("Alice")).is_err());
    }

    #[tokio::test]
    async fn test_unknown_collection_is_zero() {
        let store = InMemoryStore::new();

        assert!(store.find_ids("ghost", &Filter::All).await.unwrap().is_empty());
        assert_eq!(store.count("ghost", &Filter::All).await.unwrap(), 0);
        assert_eq!(store.delete_many("ghost", &Filter::All).await.unwrap(), 0);
        assert_eq!(
            store
                .update_many("ghost", &Filter::All, &Patch::new())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_find_ids_in_insertion_order() {
        let store = InMemoryStore::new();
        store
            .insert_many(
                "meeting",
                vec![
                    json!({"id": "m1", "space_id": "s1"}),
                    json!({"id": "m2", "space_id": "s2"}),
                    json!({"id": "m3", "space_id": "s1"}),
                ],
            )
            .unwrap();

        let ids = store
            .find_ids("meeting", &Filter::eq("space_id", "s1"))
            .await
            .unwrap();
        assert_eq!(ids, vec![json!("m1"), json!("m3")]);
    }

    #[tokio::test]
    async fn test_delete_many() {
        let store = InMemoryStore::new();
        store
            .insert_many(
                "bulletin",
                vec![
                    json!({"addedBy": "u1"}),
                    json!({"updatedBy": "u1"}),
                    json!({"addedBy": "u2"}),
                ],
            )
            .unwrap();

        let filter = Filter::referencing(&["addedBy", "updatedBy"], &[json!("u1")]);
        assert_eq!(store.delete_many("bulletin", &filter).await.unwrap(), 2);
        assert_eq!(store.len("bulletin").unwrap(), 1);
        assert_eq!(store.delete_many("bulletin", &filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_many_applies_patch() {
        let store = InMemoryStore::new();
        store.insert("role", json!({"id": "r1"})).unwrap();
        store.insert("role", json!({"id": "r2"})).unwrap();

        let updated = store
            .update_many("role", &Filter::by_id("r1"), &Lifecycle::SoftDeleted.patch())
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let active = store.list("role", &Lifecycle::Active.filter()).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0]["id"], "r2");
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store.insert("learn", json!({})).unwrap();

        assert_eq!(other.count("learn", &Filter::All).await.unwrap(), 1);
        assert!(!other.is_empty("learn").unwrap());
    }
}
