//! HTTP handlers for cascade operations
//!
//! Handlers are collection-agnostic: the collection comes from the path and
//! is resolved against the relationship graph by the engine.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::cascade::CascadeResult;
use crate::core::{CascadeError, Filter, Lifecycle};
use crate::entities::DependentService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DependentService>,
}

/// Body of `DELETE /{collection}/delete/{id}`
#[derive(Debug, Default, Deserialize)]
pub struct DeleteRequest {
    /// Only count the dependents, leave everything in place
    #[serde(rename = "isWarning", default)]
    pub is_warning: bool,
}

/// Body of the `*Many` routes
#[derive(Debug, Default, Deserialize)]
pub struct IdsRequest {
    #[serde(default)]
    pub ids: Option<Vec<Value>>,
    #[serde(rename = "isWarning", default)]
    pub is_warning: bool,
}

impl IdsRequest {
    fn filter(self) -> Result<(Filter, bool), CascadeError> {
        match self.ids {
            Some(ids) if !ids.is_empty() => Ok((Filter::by_ids(ids), self.is_warning)),
            _ => Err(CascadeError::Request {
                message: "'ids' must be a non-empty array".to_string(),
            }),
        }
    }
}

/// Body of `POST /{collection}/dependents/count`
#[derive(Debug, Default, Deserialize)]
pub struct CountRequest {
    #[serde(default)]
    pub filter: Option<Value>,
}

/// Successful response envelope
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub status: &'static str,
    pub data: CascadeResult,
}

impl SuccessResponse {
    pub fn new(data: CascadeResult) -> Json<Self> {
        Json(Self {
            status: "SUCCESS",
            data,
        })
    }
}

type HandlerResult = Result<Json<SuccessResponse>, CascadeError>;

/// Delete one record and its dependents, or count them when `isWarning` is set
pub async fn delete_one(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    body: Option<Json<DeleteRequest>>,
) -> HandlerResult {
    let Json(request) = body.unwrap_or_default();
    let filter = Filter::by_id(id);

    let result = if request.is_warning {
        state.service.count(&collection, filter).await?
    } else {
        state.service.delete(&collection, filter).await?
    };

    Ok(SuccessResponse::new(result))
}

/// Delete several records by id, or count their dependents when `isWarning` is set
pub async fn delete_many(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(request): Json<IdsRequest>,
) -> HandlerResult {
    let (filter, is_warning) = request.filter()?;

    let result = if is_warning {
        state.service.count(&collection, filter).await?
    } else {
        state.service.delete(&collection, filter).await?
    };

    Ok(SuccessResponse::new(result))
}

/// Soft-delete one record and its dependents
pub async fn soft_delete_one(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> HandlerResult {
    let result = state
        .service
        .soft_delete(&collection, Filter::by_id(id), Lifecycle::SoftDeleted.patch())
        .await?;

    Ok(SuccessResponse::new(result))
}

/// Soft-delete several records by id
pub async fn soft_delete_many(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(request): Json<IdsRequest>,
) -> HandlerResult {
    let (filter, _) = request.filter()?;

    let result = state
        .service
        .soft_delete(&collection, filter, Lifecycle::SoftDeleted.patch())
        .await?;

    Ok(SuccessResponse::new(result))
}

/// Count dependents of the records matching an arbitrary filter
pub async fn count_dependents(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(request): Json<CountRequest>,
) -> HandlerResult {
    let filter = match request.filter {
        Some(value) => Filter::from_json(&value)?,
        None => Filter::All,
    };

    let result = state.service.count(&collection, filter).await?;
    Ok(SuccessResponse::new(result))
}
