//! Per-entity cascade API
//!
//! Thin entry points used by controllers: each one builds a
//! [`CascadeRequest`] for its collection and hands it to the engine.

use crate::cascade::{CascadeEngine, CascadeRequest, CascadeResult};
use crate::core::{CascadeError, Filter, Patch};
use crate::impl_dependent_wrappers;

/// Delete / count / soft-delete with dependent records
#[derive(Clone)]
pub struct DependentService {
    engine: CascadeEngine,
}

impl DependentService {
    pub fn new(engine: CascadeEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &CascadeEngine {
        &self.engine
    }

    /// Hard-delete `collection` records matching `filter`, dependents first
    pub async fn delete(
        &self,
        collection: &str,
        filter: Filter,
    ) -> Result<CascadeResult, CascadeError> {
        self.engine
            .execute(&CascadeRequest::hard_delete(collection, filter))
            .await
    }

    /// Count the dependents of `collection` records matching `filter`
    pub async fn count(
        &self,
        collection: &str,
        filter: Filter,
    ) -> Result<CascadeResult, CascadeError> {
        self.engine
            .execute(&CascadeRequest::count(collection, filter))
            .await
    }

    /// Apply `patch` to `collection` records matching `filter`, dependents first
    pub async fn soft_delete(
        &self,
        collection: &str,
        filter: Filter,
        patch: Patch,
    ) -> Result<CascadeResult, CascadeError> {
        self.engine
            .execute(&CascadeRequest::soft_delete(collection, filter, patch))
            .await
    }
}

impl_dependent_wrappers!(DependentService, {
    "user_x_meeting" => (delete_user_x_meeting, count_user_x_meeting, soft_delete_user_x_meeting),
    "experties" => (delete_experties, count_experties, soft_delete_experties),
    "tieups" => (delete_tieups, count_tieups, soft_delete_tieups),
    "learn" => (delete_learn, count_learn, soft_delete_learn),
    "bulletin" => (delete_bulletin, count_bulletin, soft_delete_bulletin),
    "user_x_webinar" => (delete_user_x_webinar, count_user_x_webinar, soft_delete_user_x_webinar),
    "meeting" => (delete_meeting, count_meeting, soft_delete_meeting),
    "space" => (delete_space, count_space, soft_delete_space),
    "company" => (delete_company, count_company, soft_delete_company),
    "user" => (delete_user, count_user, soft_delete_user),
    "userTokens" => (delete_user_tokens, count_user_tokens, soft_delete_user_tokens),
    "role" => (delete_role, count_role, soft_delete_role),
    "projectRoute" => (delete_project_route, count_project_route, soft_delete_project_route),
    "routeRole" => (delete_route_role, count_route_role, soft_delete_route_role),
    "userRole" => (delete_user_role, count_user_role, soft_delete_user_role),
});
