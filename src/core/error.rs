//! Typed error handling for cascade operations
//!
//! Every failure aborts the whole cascade and is reported to the caller;
//! there is no partial or best-effort result.
//!
//! # Error Categories
//!
//! - [`CascadeError::Configuration`]: unregistered collection or invalid graph
//! - [`CascadeError::UnsupportedDepth`]: a relationship path deeper than two levels
//! - [`CascadeError::Cascade`]: a storage failure while processing a collection
//! - [`CascadeError::Filter`]: a malformed query predicate
//! - [`CascadeError::Request`]: a malformed HTTP request
//!
//! # Example
//!
//! ```rust,ignore
//! match service.delete_user(filter).await {
//!     Ok(report) => println!("removed: {:?}", report),
//!     Err(CascadeError::Cascade { collection, source }) => {
//!         eprintln!("storage failed on {}: {}", collection, source);
//!     }
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The main error type for cascade operations
#[derive(Debug, Error)]
pub enum CascadeError {
    /// The relationship configuration is unusable for this request
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The graph declares a cascade deeper than the two supported levels
    #[error("Unsupported cascade depth from '{root}': path {} exceeds {max} levels", .path.join(" -> "))]
    UnsupportedDepth {
        root: String,
        path: Vec<String>,
        max: usize,
    },

    /// A storage call failed while processing `collection`
    #[error("Cascade failed on '{collection}': {source}")]
    Cascade {
        collection: String,
        #[source]
        source: anyhow::Error,
    },

    /// The filter could not be interpreted
    #[error("Invalid filter: {message}")]
    Filter { message: String },

    /// The HTTP request is missing required parameters
    #[error("Bad request: {message}")]
    Request { message: String },
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CascadeError {
    /// Build a configuration error for a collection that has no registration
    pub fn unregistered(collection: &str) -> Self {
        CascadeError::Configuration {
            message: format!("collection '{}' is not registered", collection),
        }
    }

    /// Wrap a storage failure with the collection being processed
    pub fn storage(collection: &str, source: anyhow::Error) -> Self {
        CascadeError::Cascade {
            collection: collection.to_string(),
            source,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CascadeError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CascadeError::UnsupportedDepth { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CascadeError::Cascade { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CascadeError::Filter { .. } => StatusCode::BAD_REQUEST,
            CascadeError::Request { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CascadeError::Configuration { .. } => "CONFIGURATION_ERROR",
            CascadeError::UnsupportedDepth { .. } => "UNSUPPORTED_DEPTH",
            CascadeError::Cascade { .. } => "CASCADE_ERROR",
            CascadeError::Filter { .. } => "INVALID_FILTER",
            CascadeError::Request { .. } => "BAD_REQUEST",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            CascadeError::Cascade { collection, .. } => {
                Some(serde_json::json!({ "collection": collection }))
            }
            CascadeError::UnsupportedDepth { root, path, max } => Some(serde_json::json!({
                "root": root,
                "path": path,
                "max_depth": max,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for CascadeError {
    fn into_response(self) -> Response {
        if self.status_code().is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        }
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}
