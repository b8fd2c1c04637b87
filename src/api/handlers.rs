//! API Handlers
//!
//! HTTP request handlers for the admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{
    ClearResponse, HealthResponse, ModulesResponse, SetEnabledRequest, SetEnabledResponse,
    StatsResponse, UserResponse,
};
use crate::modules::ModuleRegistry;
use crate::users::UserDataService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Coalesced user profile cache
    pub user_data: Arc<UserDataService>,
    /// Registered modules and readiness
    pub registry: Arc<ModuleRegistry>,
}

impl AppState {
    pub fn new(user_data: Arc<UserDataService>, registry: Arc<ModuleRegistry>) -> Self {
        Self {
            user_data,
            registry,
        }
    }
}

/// Handler for GET /users/:id
///
/// Returns the cached or freshly fetched profile. A profile that cannot be
/// obtained right now is reported as 404.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>> {
    let detail = state
        .user_data
        .get_user_info(&user_id)
        .await
        .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;

    Ok(Json(UserResponse::new(user_id, detail)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.user_data.cache_stats()))
}

/// Handler for DELETE /cache
///
/// Clears both tiers of the user data cache.
pub async fn clear_cache_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let removed = state.user_data.clear_all_cache()?;
    info!(removed, "User data cache cleared via API");
    Ok(Json(ClearResponse::new(removed)))
}

/// Handler for GET /modules
pub async fn list_modules_handler(State(state): State<AppState>) -> Json<ModulesResponse> {
    Json(ModulesResponse {
        ready: state.registry.ready().is_ready(),
        modules: state.registry.summaries(),
    })
}

/// Handler for PUT /modules/:id/enabled
///
/// Persists the flag; the running session keeps the value read at
/// registration.
pub async fn set_module_enabled_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetEnabledRequest>,
) -> Result<Json<SetEnabledResponse>> {
    if id.trim().is_empty() {
        return Err(Error::InvalidRequest("module id cannot be empty".to_string()));
    }
    state.registry.settings().set_module_enabled(&id, req.enabled)?;
    info!(module = %id, enabled = req.enabled, "Module enablement updated");
    Ok(Json(SetEnabledResponse::new(id, req.enabled)))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.registry.ready().is_ready()))
}
