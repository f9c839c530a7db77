//! Cascade engine
//!
//! Executes a [`CascadeRequest`] against the [`RelationshipGraph`]:
//!
//! 1. A root without edges degenerates to one operation on the root itself.
//! 2. Otherwise the root identifiers are resolved; none → `{ root: 0 }`.
//! 3. Each edge from the root is applied to the records referencing those
//!    identifiers. A flattened edge first resolves its own child identifiers,
//!    applies the child's edges, then applies the mode to the child.
//! 4. Mutating modes touch the root records last.
//!
//! Any storage failure aborts the request; no partial report is returned.

use crate::cascade::graph::{RelationshipEdge, RelationshipGraph};
use crate::cascade::report::CascadeResult;
use crate::core::{CascadeError, CollectionAccessor, Filter, Patch};
use futures::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

/// What a cascade does to every matched collection
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeMode {
    /// Only count dependent records
    Count,
    /// Remove dependent records, then the roots
    HardDelete,
    /// Apply the patch to dependent records, then to the roots
    SoftDelete(Patch),
}

impl CascadeMode {
    pub fn name(&self) -> &'static str {
        match self {
            CascadeMode::Count => "COUNT",
            CascadeMode::HardDelete => "HARD_DELETE",
            CascadeMode::SoftDelete(_) => "SOFT_DELETE",
        }
    }

    /// Whether the root records are touched after the cascade
    pub fn mutates(&self) -> bool {
        !matches!(self, CascadeMode::Count)
    }
}

/// One cascade invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeRequest {
    pub root: String,
    pub filter: Filter,
    pub mode: CascadeMode,
}

impl CascadeRequest {
    pub fn new(root: impl Into<String>, filter: Filter, mode: CascadeMode) -> Self {
        Self {
            root: root.into(),
            filter,
            mode,
        }
    }

    pub fn count(root: impl Into<String>, filter: Filter) -> Self {
        Self::new(root, filter, CascadeMode::Count)
    }

    pub fn hard_delete(root: impl Into<String>, filter: Filter) -> Self {
        Self::new(root, filter, CascadeMode::HardDelete)
    }

    pub fn soft_delete(root: impl Into<String>, filter: Filter, patch: Patch) -> Self {
        Self::new(root, filter, CascadeMode::SoftDelete(patch))
    }
}

/// Engine tuning
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Run the first-level edges of a request concurrently.
    ///
    /// Report order and root-last ordering are unchanged.
    pub concurrent_fanout: bool,
}

/// Graph-driven cascade interpreter
#[derive(Clone)]
pub struct CascadeEngine {
    graph: Arc<RelationshipGraph>,
    accessor: Arc<dyn CollectionAccessor>,
    options: EngineOptions,
}

impl CascadeEngine {
    pub fn new(graph: Arc<RelationshipGraph>, accessor: Arc<dyn CollectionAccessor>) -> Self {
        Self {
            graph,
            accessor,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn graph(&self) -> &RelationshipGraph {
        &self.graph
    }

    pub fn accessor(&self) -> &Arc<dyn CollectionAccessor> {
        &self.accessor
    }

    /// Run one cascade to completion
    pub async fn execute(&self, request: &CascadeRequest) -> Result<CascadeResult, CascadeError> {
        let span = tracing::info_span!(
            "cascade",
            root = %request.root,
            mode = request.mode.name()
        );

        async move {
            let result = self.run(request).await?;
            tracing::info!(affected = result.total(), "cascade complete");
            Ok(result)
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &CascadeRequest) -> Result<CascadeResult, CascadeError> {
        let root = request.root.as_str();
        let mode = &request.mode;
        let edges = self.graph.edges_from(root)?;

        if edges.is_empty() {
            let affected = self.apply(root, &request.filter, mode).await?;
            return Ok(CascadeResult::single(root, affected));
        }

        let ids = self.find_ids(root, &request.filter).await?;
        if ids.is_empty() {
            tracing::debug!("no root records matched");
            return Ok(CascadeResult::single(root, 0));
        }

        let mut result = CascadeResult::new();
        if self.options.concurrent_fanout {
            let parts =
                try_join_all(edges.iter().map(|edge| self.cascade_edge(edge, &ids, mode))).await?;
            for part in parts {
                result.absorb(part);
            }
        } else {
            for edge in edges {
                result.absorb(self.cascade_edge(edge, &ids, mode).await?);
            }
        }

        if mode.mutates() {
            let affected = self.apply(root, &request.filter, mode).await?;
            tracing::debug!(collection = root, affected, "root records processed");
        }

        Ok(result)
    }

    async fn cascade_edge(
        &self,
        edge: &RelationshipEdge,
        parent_ids: &[Value],
        mode: &CascadeMode,
    ) -> Result<CascadeResult, CascadeError> {
        let filter = Filter::referencing(&edge.foreign_keys, parent_ids);
        let nested: &[RelationshipEdge] = if edge.flatten {
            self.graph.edges_from(&edge.child)?
        } else {
            &[]
        };

        let mut result = CascadeResult::new();
        if nested.is_empty() {
            let affected = self.apply(&edge.child, &filter, mode).await?;
            tracing::debug!(collection = %edge.child, affected, "dependents processed");
            result.record(&edge.child, affected);
            return Ok(result);
        }

        let child_ids = self.find_ids(&edge.child, &filter).await?;
        if child_ids.is_empty() {
            result.record(&edge.child, 0);
            for nested_edge in nested {
                result.record(&nested_edge.child, 0);
            }
            return Ok(result);
        }

        let mut second_level = CascadeResult::new();
        for nested_edge in nested {
            let nested_filter = Filter::referencing(&nested_edge.foreign_keys, &child_ids);
            let affected = self.apply(&nested_edge.child, &nested_filter, mode).await?;
            tracing::debug!(
                collection = %nested_edge.child,
                via = %edge.child,
                affected,
                "second-level dependents processed"
            );
            second_level.record(&nested_edge.child, affected);
        }

        let affected = self.apply(&edge.child, &filter, mode).await?;
        tracing::debug!(collection = %edge.child, affected, "dependents processed");
        result.record(&edge.child, affected);
        result.absorb(second_level);
        Ok(result)
    }

    async fn find_ids(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, CascadeError> {
        self.accessor
            .find_ids(collection, filter)
            .await
            .map_err(|e| CascadeError::storage(collection, e))
    }

    async fn apply(
        &self,
        collection: &str,
        filter: &Filter,
        mode: &CascadeMode,
    ) -> Result<u64, CascadeError> {
        let outcome = match mode {
            CascadeMode::Count => self.accessor.count(collection, filter).await,
            CascadeMode::HardDelete => self.accessor.delete_many(collection, filter).await,
            CascadeMode::SoftDelete(patch) => {
                self.accessor.update_many(collection, filter, patch).await
            }
        };
        outcome.map_err(|e| CascadeError::storage(collection, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CascadeConfig, EdgeConfig};
    use crate::core::Lifecycle;
    use crate::storage::InMemoryStore;
    use serde_json::json;

    fn engine_with(config: CascadeConfig, store: &InMemoryStore) -> CascadeEngine {
        let graph = Arc::new(RelationshipGraph::from_config(&config).unwrap());
        CascadeEngine::new(graph, Arc::new(store.clone()))
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(CascadeMode::Count.name(), "COUNT");
        assert_eq!(CascadeMode::HardDelete.name(), "HARD_DELETE");
        assert_eq!(
            CascadeMode::SoftDelete(Lifecycle::SoftDeleted.patch()).name(),
            "SOFT_DELETE"
        );
        assert!(!CascadeMode::Count.mutates());
        assert!(CascadeMode::HardDelete.mutates());
    }

    #[tokio::test]
    async fn test_unregistered_root_fails() {
        let store = InMemoryStore::new();
        let engine = engine_with(CascadeConfig::default_config(), &store);

        let err = engine
            .execute(&CascadeRequest::count("invoice", Filter::All))
            .await
            .unwrap_err();
        assert!(matches!(err, CascadeError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_company_cascade_one_level() {
        let store = InMemoryStore::new();
        store.insert("company", json!({"id": "c1"})).unwrap();
        for _ in 0..3 {
            store
                .insert("user", json!({"user_company": "c1"}))
                .unwrap();
        }
        store.insert("user", json!({"user_company": "c2"})).unwrap();

        let engine = engine_with(CascadeConfig::default_config(), &store);
        let result = engine
            .execute(&CascadeRequest::hard_delete("company", Filter::by_id("c1")))
            .await
            .unwrap();

        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"user": 3}));
        assert_eq!(store.len("company").unwrap(), 0);
        assert_eq!(store.len("user").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_flattened_edge_reports_second_level() {
        let store = InMemoryStore::new();
        store.insert("space", json!({"id": "s1"})).unwrap();
        store
            .insert("meeting", json!({"id": "m1", "space_id": "s1"}))
            .unwrap();
        store
            .insert("user_x_meeting", json!({"meeting_id": "m1"}))
            .unwrap();
        store
            .insert("user_x_meeting", json!({"meeting_id": "m1"}))
            .unwrap();

        let engine = engine_with(CascadeConfig::default_config(), &store);
        let result = engine
            .execute(&CascadeRequest::hard_delete("space", Filter::by_id("s1")))
            .await
            .unwrap();

        assert_eq!(result.collections(), vec!["meeting", "user_x_meeting"]);
        assert_eq!(result.get("meeting"), Some(1));
        assert_eq!(result.get("user_x_meeting"), Some(2));
        assert_eq!(store.len("space").unwrap(), 0);
        assert_eq!(store.len("meeting").unwrap(), 0);
        assert_eq!(store.len("user_x_meeting").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_flattened_edge_without_children_reports_zeroes() {
        let store = InMemoryStore::new();
        store.insert("space", json!({"id": "s1"})).unwrap();

        let engine = engine_with(CascadeConfig::default_config(), &store);
        let result = engine
            .execute(&CascadeRequest::count("space", Filter::by_id("s1")))
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"meeting": 0, "user_x_meeting": 0})
        );
    }

    #[tokio::test]
    async fn test_concurrent_fanout_keeps_declaration_order() {
        let store = InMemoryStore::new();
        store.insert("role", json!({"id": "r1"})).unwrap();
        store.insert("userRole", json!({"roleId": "r1"})).unwrap();
        store.insert("routeRole", json!({"roleId": "r1"})).unwrap();
        store.insert("routeRole", json!({"roleId": "r1"})).unwrap();

        let engine = engine_with(CascadeConfig::default_config(), &store).with_options(
            EngineOptions {
                concurrent_fanout: true,
            },
        );
        let result = engine
            .execute(&CascadeRequest::soft_delete(
                "role",
                Filter::by_id("r1"),
                Lifecycle::SoftDeleted.patch(),
            ))
            .await
            .unwrap();

        assert_eq!(result.collections(), vec!["routeRole", "userRole"]);
        assert_eq!(result.get("routeRole"), Some(2));
        assert_eq!(result.get("userRole"), Some(1));

        let role = store.get("role", &json!("r1")).unwrap().unwrap();
        assert_eq!(Lifecycle::of(&role), Lifecycle::SoftDeleted);
    }

    #[tokio::test]
    async fn test_duplicate_child_key_is_summed() {
        let config = CascadeConfig {
            collections: vec![],
            edges: vec![
                EdgeConfig::new("space", "meeting", &["space_id"]).flattened(),
                EdgeConfig::new("space", "attendance", &["space_id"]),
                EdgeConfig::new("meeting", "attendance", &["meeting_id"]),
            ],
        };
        let store = InMemoryStore::new();
        store.insert("space", json!({"id": "s1"})).unwrap();
        store
            .insert("meeting", json!({"id": "m1", "space_id": "s1"}))
            .unwrap();
        store
            .insert("attendance", json!({"meeting_id": "m1"}))
            .unwrap();
        store
            .insert("attendance", json!({"space_id": "s1"}))
            .unwrap();

        let engine = engine_with(config, &store);
        let result = engine
            .execute(&CascadeRequest::count("space", Filter::by_id("s1")))
            .await
            .unwrap();

        assert_eq!(result.collections(), vec!["meeting", "attendance"]);
        assert_eq!(result.get("attendance"), Some(2));
    }
}
