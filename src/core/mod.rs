//! Core types shared by the engine, the stores and the HTTP layer

pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod service;

pub use error::{CascadeError, ErrorResponse};
pub use filter::Filter;
pub use lifecycle::{Lifecycle, Patch};
pub use service::CollectionAccessor;
