//! Per-entity cascade entry points

pub mod dependents;
pub mod macros;

pub use dependents::DependentService;
