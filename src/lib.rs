//! # Dependent Cascade
//!
//! Delete, soft-delete or count a record together with every record that
//! references it, driven by a declarative relationship table.
//!
//! ## Features
//!
//! - **Relationship Graph**: parent → child edges with foreign-key fields, loaded from YAML
//! - **One Engine**: count, hard delete and soft delete share one traversal
//! - **Flat Report**: one `collection → count` entry per affected collection
//! - **Two-Level Flattening**: selected edges pull in the child's own dependents
//! - **Pluggable Storage**: in-memory store by default, MongoDB behind a feature flag
//! - **HTTP Surface**: generic axum routes with an `isWarning` dry-run flag
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cascade::prelude::*;
//!
//! let store = InMemoryStore::new();
//! let graph = RelationshipGraph::from_config(&CascadeConfig::default_config())?;
//! let service = DependentService::new(CascadeEngine::new(Arc::new(graph), Arc::new(store)));
//!
//! // Count first...
//! let report = service.count_user(Filter::by_id("u1")).await?;
//!
//! // ...then delete, children before the user itself
//! let report = service.delete_user(Filter::by_id("u1")).await?;
//! ```

pub mod cascade;
pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Cascade ===
    pub use crate::cascade::{
        CascadeEngine, CascadeMode, CascadeRequest, CascadeResult, EngineOptions, MAX_DEPTH,
        RelationshipEdge, RelationshipGraph,
    };

    // === Core ===
    pub use crate::core::{
        CascadeError, CollectionAccessor, ErrorResponse, Filter, Lifecycle, Patch,
    };

    // === Configuration ===
    pub use crate::config::{CascadeConfig, EdgeConfig};

    // === Entities ===
    pub use crate::entities::DependentService;
    pub use crate::impl_dependent_wrappers;

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};

    // === Storage ===
    pub use crate::storage::InMemoryStore;

    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoStore;

    // === Re-exports from dependencies ===
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
}
