//! MongoDB storage backend using the official MongoDB async driver.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! dependent-cascade = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! One MongoDB collection per cascade collection, named exactly as in the
//! relationship graph (`user`, `user_x_meeting`, ...). Identifiers live in
//! `_id`; filters written against `id` are renamed on the way in.
//!
//! # Serialization strategy
//!
//! Filters and patches are rendered to JSON first, then parsed as extended
//! JSON into BSON. Identifiers come back as relaxed extended JSON, so string
//! ids stay strings and ObjectIds become `{"$oid": "..."}`, which parse back
//! into ObjectIds when used in a child filter.
//!
//! # Identifiers
//!
//! A string `_id` operand that is a valid 24-character hex ObjectId is sent
//! as an ObjectId, so `delete/{id}` paths reach ObjectId-keyed collections.
//! Collections keyed by 24-hex *strings* are not supported.

use crate::core::filter::{ID_ALIAS, ID_FIELD};
use crate::core::{CollectionAccessor, Filter, Patch};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a JSON object into a BSON Document, renaming every `id` key to `_id`.
fn json_to_document(json: Value) -> Result<Document> {
    let bson_val =
        Bson::try_from(json).map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    match rename_ids(bson_val) {
        Bson::Document(d) => Ok(d),
        _ => Err(anyhow!("Expected BSON document, got non-object")),
    }
}

fn rename_ids(value: Bson) -> Bson {
    match value {
        Bson::Document(doc) => Bson::Document(
            doc.into_iter()
                .map(|(key, value)| {
                    if key == ID_ALIAS || key == ID_FIELD {
                        (ID_FIELD.to_string(), object_ids(rename_ids(value)))
                    } else {
                        (key, rename_ids(value))
                    }
                })
                .collect(),
        ),
        Bson::Array(items) => Bson::Array(items.into_iter().map(rename_ids).collect()),
        other => other,
    }
}

/// Turn ObjectId-shaped strings in an `_id` operand into ObjectIds.
fn object_ids(value: Bson) -> Bson {
    match value {
        Bson::String(s) => match ObjectId::parse_str(&s) {
            Ok(oid) => Bson::ObjectId(oid),
            Err(_) => Bson::String(s),
        },
        Bson::Array(items) => Bson::Array(items.into_iter().map(object_ids).collect()),
        Bson::Document(doc) => Bson::Document(
            doc.into_iter()
                .map(|(op, operand)| (op, object_ids(operand)))
                .collect(),
        ),
        other => other,
    }
}

/// Convert a Filter into a MongoDB query document.
fn filter_to_document(filter: &Filter) -> Result<Document> {
    json_to_document(filter.to_json())
}

// ---------------------------------------------------------------------------
// MongoStore
// ---------------------------------------------------------------------------

/// Collection accessor backed by MongoDB.
///
/// `_id` operands that parse as ObjectIds are queried as ObjectIds; all other
/// ids are queried as-is. See the module docs.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use cascade::storage::MongoStore;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let store = MongoStore::new(client.database("meetings"));
/// let engine = CascadeEngine::new(graph, Arc::new(store));
/// ```
#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Create a new `MongoStore` with the given database handle.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.database.collection(name)
    }
}

#[async_trait]
impl CollectionAccessor for MongoStore {
    /// Reads only `_id` through a projection.
    async fn find_ids(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        let cursor = self
            .collection(collection)
            .find(filter_to_document(filter)?)
            .projection(doc! { ID_FIELD: 1 })
            .await
            .map_err(|e| anyhow!("Failed to find ids in {}: {}", collection, e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect ids from {}: {}", collection, e))?;

        Ok(docs
            .into_iter()
            .filter_map(|mut d| d.remove(ID_FIELD))
            .map(Bson::into_relaxed_extjson)
            .collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        self.collection(collection)
            .count_documents(filter_to_document(filter)?)
            .await
            .map_err(|e| anyhow!("Failed to count {}: {}", collection, e))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let result = self
            .collection(collection)
            .delete_many(filter_to_document(filter)?)
            .await
            .map_err(|e| anyhow!("Failed to delete from {}: {}", collection, e))?;

        Ok(result.deleted_count)
    }

    async fn update_many(&self, collection: &str, filter: &Filter, patch: &Patch) -> Result<u64> {
        if patch.is_empty() {
            return Ok(0);
        }

        let update = json_to_document(patch.to_set_document())?;
        let result = self
            .collection(collection)
            .update_many(filter_to_document(filter)?, update)
            .await
            .map_err(|e| anyhow!("Failed to update {}: {}", collection, e))?;

        Ok(result.modified_count)
    }
}
