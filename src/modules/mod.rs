//! Modules Module
//!
//! Compiled-in feature modules, the manifest that selects them, and the
//! bootstrap that loads and initializes them with per-module isolation.
//!
//! # Startup
//! 1. Fetch the manifest through the resource cache
//! 2. Load each listed module's resource through the cache
//! 3. Instantiate listed modules from the build-time catalog
//! 4. Register them, reading each module's enablement flag once
//! 5. Run every enabled module's `init`, then signal readiness

mod bootstrap;
mod catalog;
mod ready;
mod registry;

pub use bootstrap::{Bootstrap, BootstrapReport, CONFIG_CACHE_KEY, MODULE_CACHE_KEY_PREFIX};
pub use catalog::{ModuleCatalog, ModuleFactory, ModuleSource};
pub use ready::ReadySignal;
pub use registry::{InitOutcome, InitStatus, ModuleDescriptor, ModuleRegistry, ModuleSummary};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// == Module ==
/// Capability contract every feature module implements.
#[async_trait]
pub trait Module: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Called once per session for enabled modules.
    async fn init(&self) -> anyhow::Result<()>;
}

// == Manifest ==
/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Remote module manifest: `{ "modules": [ { "id", "name", "url" } ] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub modules: Vec<ModuleInfo>,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Manifest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(
            r#"{"modules":[{"id":"userDataService","name":"User data","url":"https://x/u.js"}]}"#,
        )
        .unwrap();

        assert_eq!(manifest.modules.len(), 1);
        assert_eq!(manifest.modules[0].id, "userDataService");
    }

    #[test]
    fn test_parse_invalid_manifest() {
        assert!(matches!(Manifest::parse("{\"mods\": 1}"), Err(Error::Manifest(_))));
    }
}
