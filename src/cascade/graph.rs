//! Relationship graph for cascade resolution
//!
//! Built once from a [`CascadeConfig`] and immutable afterwards. Share it
//! through an `Arc`; no locking is involved.

use crate::config::CascadeConfig;
use crate::core::CascadeError;
use indexmap::{IndexMap, IndexSet};

/// Deepest cascade the engine performs: the root's children, plus the
/// children of flattened edges.
pub const MAX_DEPTH: usize = 2;

/// Records in `child` reference records in `parent` through any of `foreign_keys`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipEdge {
    pub parent: String,
    pub child: String,
    pub foreign_keys: Vec<String>,
    pub flatten: bool,
}

/// Parent collection → ordered edges, plus every registered collection
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    collections: IndexSet<String>,
    edges: IndexMap<String, Vec<RelationshipEdge>>,
}

impl RelationshipGraph {
    /// Build and validate a graph
    ///
    /// Collections named by an edge are registered implicitly. Fails with
    /// [`CascadeError::Configuration`] for an edge without reference fields
    /// or a duplicated parent/child pair, and with
    /// [`CascadeError::UnsupportedDepth`] when a flattened edge leads to
    /// another flattened edge that has children of its own.
    pub fn from_config(config: &CascadeConfig) -> Result<Self, CascadeError> {
        let mut graph = RelationshipGraph::default();

        for collection in &config.collections {
            graph.register(collection)?;
        }

        for edge in &config.edges {
            graph.register(&edge.parent)?;
            graph.register(&edge.child)?;

            if edge.foreign_keys.is_empty() || edge.foreign_keys.iter().any(|f| f.is_empty()) {
                return Err(CascadeError::Configuration {
                    message: format!(
                        "edge '{}' -> '{}' needs at least one non-empty foreign key",
                        edge.parent, edge.child
                    ),
                });
            }

            let siblings = graph.edges.entry(edge.parent.clone()).or_default();
            if siblings.iter().any(|e| e.child == edge.child) {
                return Err(CascadeError::Configuration {
                    message: format!(
                        "edge '{}' -> '{}' is declared twice",
                        edge.parent, edge.child
                    ),
                });
            }

            siblings.push(RelationshipEdge {
                parent: edge.parent.clone(),
                child: edge.child.clone(),
                foreign_keys: edge.foreign_keys.clone(),
                flatten: edge.flatten,
            });
        }

        graph.validate_depth()?;

        tracing::debug!(
            collections = graph.collections.len(),
            edges = graph.edges.values().map(Vec::len).sum::<usize>(),
            "relationship graph built"
        );

        Ok(graph)
    }

    fn register(&mut self, collection: &str) -> Result<(), CascadeError> {
        if collection.trim().is_empty() {
            return Err(CascadeError::Configuration {
                message: "collection names must not be empty".to_string(),
            });
        }
        self.collections.insert(collection.to_string());
        Ok(())
    }

    fn validate_depth(&self) -> Result<(), CascadeError> {
        for (root, first_level) in &self.edges {
            for first in first_level.iter().filter(|e| e.flatten) {
                for second in self.children(&first.child).iter().filter(|e| e.flatten) {
                    if let Some(third) = self.children(&second.child).first() {
                        return Err(CascadeError::UnsupportedDepth {
                            root: root.clone(),
                            path: vec![
                                root.clone(),
                                first.child.clone(),
                                second.child.clone(),
                                third.child.clone(),
                            ],
                            max: MAX_DEPTH,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn children(&self, collection: &str) -> &[RelationshipEdge] {
        self.edges.get(collection).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether cascades may be requested for `collection`
    pub fn is_registered(&self, collection: &str) -> bool {
        self.collections.contains(collection)
    }

    /// Edges leaving `collection`, in declaration order
    ///
    /// A registered leaf yields an empty slice; an unregistered collection
    /// is a configuration error.
    pub fn edges_from(&self, collection: &str) -> Result<&[RelationshipEdge], CascadeError> {
        if !self.is_registered(collection) {
            return Err(CascadeError::unregistered(collection));
        }
        Ok(self.children(collection))
    }

    /// Registered collections in registration order
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(String::as_str)
    }

    /// Collections that `collection` cascades into, flattened levels included
    pub fn reachable_from(&self, collection: &str) -> Result<Vec<&str>, CascadeError> {
        let mut reached: IndexSet<&str> = IndexSet::new();
        for edge in self.edges_from(collection)? {
            reached.insert(edge.child.as_str());
            if edge.flatten {
                for nested in self.children(&edge.child) {
                    reached.insert(nested.child.as_str());
                }
            }
        }
        Ok(reached.into_iter().collect())
    }
}
