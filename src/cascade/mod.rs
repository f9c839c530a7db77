//! Dependency graph cascade
//!
//! A static relationship table plus one interpreter replaces the
//! hand-written delete/count/soft-delete function per entity.

pub mod engine;
pub mod graph;
pub mod report;

pub use engine::{CascadeEngine, CascadeMode, CascadeRequest, EngineOptions};
pub use graph::{MAX_DEPTH, RelationshipEdge, RelationshipGraph};
pub use report::CascadeResult;
