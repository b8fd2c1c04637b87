//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::modules::ModuleSummary;

/// Response body for GET /users/:id
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub detail: Value,
}

impl UserResponse {
    pub fn new(user_id: impl Into<String>, detail: Value) -> Self {
        Self {
            user_id: user_id.into(),
            detail,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate across both tiers
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Persistent entries removed
    pub removed: usize,
}

impl ClearResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: "All user data caches cleared".to_string(),
            removed,
        }
    }
}

/// Response body for GET /modules
#[derive(Debug, Clone, Serialize)]
pub struct ModulesResponse {
    pub ready: bool,
    pub modules: Vec<ModuleSummary>,
}

/// Response body for PUT /modules/:id/enabled
#[derive(Debug, Clone, Serialize)]
pub struct SetEnabledResponse {
    pub message: String,
    pub id: String,
    pub enabled: bool,
}

impl SetEnabledResponse {
    pub fn new(id: impl Into<String>, enabled: bool) -> Self {
        let id = id.into();
        Self {
            message: format!(
                "Module '{}' {} from next start",
                id,
                if enabled { "enabled" } else { "disabled" }
            ),
            id,
            enabled,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Whether every module has been attempted
    pub ready: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(ready: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            ready,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
