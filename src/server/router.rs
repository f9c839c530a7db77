//! Router builder utilities for cascade routes

use super::handlers::{
    AppState, count_dependents, delete_many, delete_one, soft_delete_many, soft_delete_one,
};
use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

/// Build cascade routes
///
/// These routes are generic and work for every registered collection:
/// - DELETE /{collection}/delete/{id} - Delete one record (count with `isWarning`)
/// - POST /{collection}/deleteMany - Delete by ids (count with `isWarning`)
/// - PUT /{collection}/softDelete/{id} - Soft-delete one record
/// - PUT /{collection}/softDeleteMany - Soft-delete by ids
/// - POST /{collection}/dependents/count - Count dependents for a filter
pub fn build_cascade_routes(state: AppState) -> Router {
    Router::new()
        .route("/{collection}/delete/{id}", delete(delete_one))
        .route("/{collection}/deleteMany", post(delete_many))
        .route("/{collection}/softDelete/{id}", put(soft_delete_one))
        .route("/{collection}/softDeleteMany", put(soft_delete_many))
        .route("/{collection}/dependents/count", post(count_dependents))
        .with_state(state)
}

/// Build health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "dependent-cascade"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{CascadeEngine, RelationshipGraph};
    use crate::config::CascadeConfig;
    use crate::entities::DependentService;
    use crate::storage::InMemoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let graph = RelationshipGraph::from_config(&CascadeConfig::default_config()).unwrap();
        let engine = CascadeEngine::new(Arc::new(graph), Arc::new(InMemoryStore::new()));
        let state = AppState {
            service: Arc::new(DependentService::new(engine)),
        };
        health_routes().merge(build_cascade_routes(state))
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let response = app()
            .oneshot(Request::get("/user/delete/u1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_delete_route_is_wired() {
        let response = app()
            .oneshot(
                Request::delete("/user/delete/u1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
