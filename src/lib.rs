//! nsaide - forum helper core
//!
//! Two-tier TTL caching with request coalescing over a durable key-value
//! store, plus a module registry that bootstraps from a remote manifest.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod modules;
pub mod store;
pub mod tasks;
pub mod users;

pub use api::AppState;
pub use config::Config;
pub use error::{Error, Result};
pub use tasks::spawn_reconcile_task;
