//! Storage trait consumed by the cascade engine

use crate::core::filter::Filter;
use crate::core::lifecycle::Patch;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Primitive operations on a single named collection
///
/// The cascade engine needs nothing more than these four calls. The
/// framework is agnostic to the underlying storage mechanism.
///
/// Every operation treats "nothing matched" as zero (or an empty list),
/// never as an error.
#[async_trait]
pub trait CollectionAccessor: Send + Sync {
    /// Identifiers of the records matching `filter`
    ///
    /// Implementations should read only the identifier field.
    async fn find_ids(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>>;

    /// Number of records matching `filter`
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Remove the records matching `filter`, returning how many were removed
    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Apply `patch` to the records matching `filter`, returning how many were updated
    async fn update_many(&self, collection: &str, filter: &Filter, patch: &Patch) -> Result<u64>;
}
