//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Reconcile: Drops expired user data entries from the persistent tier

mod reconcile;

pub use reconcile::spawn_reconcile_task;
