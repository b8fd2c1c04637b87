//! API Module
//!
//! HTTP handlers and routing for the admin REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check and readiness
//! - `GET /stats` - User data cache statistics
//! - `GET /users/:id` - Coalesced profile lookup
//! - `DELETE /cache` - Clear the user data cache
//! - `GET /modules` - Registered modules and their init status
//! - `PUT /modules/:id/enabled` - Persist a module's enablement flag

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
