//! Persisted per-module settings.

use std::sync::Arc;

use tracing::warn;

use super::KeyValueStore;
use crate::error::Result;

/// Typed view over the store for module enablement flags.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn KeyValueStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Storage key holding the enablement flag of module `id`.
    pub fn enabled_key(id: &str) -> String {
        format!("module_{}_enabled", id)
    }

    /// Whether module `id` is enabled. Absent or unreadable flags mean enabled.
    pub fn module_enabled(&self, id: &str) -> bool {
        let key = Self::enabled_key(id);
        match self.store.get(&key) {
            Ok(Some(raw)) => serde_json::from_str::<bool>(&raw).unwrap_or_else(|_| {
                warn!(key = %key, value = %raw, "Ignoring malformed module flag");
                true
            }),
            Ok(None) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read module flag");
                true
            }
        }
    }

    /// Persists the enablement flag of module `id`.
    pub fn set_module_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        self.store
            .set(&Self::enabled_key(id), if enabled { "true" } else { "false" })
    }
}
