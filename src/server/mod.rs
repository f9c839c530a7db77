//! Server module for exposing cascade operations over HTTP
//!
//! This module provides a `ServerBuilder` that wires an accessor and a
//! relationship configuration into an axum router with:
//! - Cascade routes for every registered collection
//! - Health check routes

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::AppState;
