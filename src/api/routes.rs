//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, get_user_handler, health_handler, list_modules_handler,
    set_module_enabled_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/users/:id", get(get_user_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/modules", get(list_modules_handler))
        .route("/modules/:id/enabled", put(set_module_enabled_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
