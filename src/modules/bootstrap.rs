//! Bootstrap
//!
//! Fetches the manifest, loads and registers listed modules, and runs their
//! init hooks.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use super::{Manifest, ModuleCatalog, ModuleInfo, ModuleRegistry, ModuleSource, Module};
use crate::error::{Error, Result};
use crate::fetch::RemoteResources;

/// Resource cache key of the manifest text.
pub const CONFIG_CACHE_KEY: &str = "ns_config_cache";

/// Resource cache key prefix for module sources; the module id is appended.
pub const MODULE_CACHE_KEY_PREFIX: &str = "ns_module_cache_";

/// What one bootstrap run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    /// Modules listed in the manifest
    pub listed: usize,
    /// Modules registered with the registry
    pub registered: usize,
    /// Ids of listed modules that could not be loaded or registered
    pub skipped: Vec<String>,
    /// Modules whose init succeeded
    pub initialized: usize,
    /// Modules whose init failed
    pub failed: usize,
}

pub struct Bootstrap {
    resources: RemoteResources,
    registry: Arc<ModuleRegistry>,
    catalog: ModuleCatalog,
    config_url: String,
}

impl Bootstrap {
    pub fn new(
        resources: RemoteResources,
        registry: Arc<ModuleRegistry>,
        catalog: ModuleCatalog,
        config_url: impl Into<String>,
    ) -> Self {
        Self {
            resources,
            registry,
            catalog,
            config_url: config_url.into(),
        }
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    // == Run ==
    /// Loads every listed module independently and initializes those that
    /// registered.
    ///
    /// Only a missing or malformed manifest fails the run; individual
    /// modules are skipped with a logged error.
    pub async fn run(&self) -> Result<BootstrapReport> {
        info!(url = %self.config_url, "Bootstrap starting");

        let text = self
            .resources
            .fetch_with_cache(&self.config_url, CONFIG_CACHE_KEY)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load module manifest");
                Error::Manifest(e.to_string())
            })?;
        let manifest = Manifest::parse(&text)?;

        let mut report = BootstrapReport {
            listed: manifest.modules.len(),
            ..BootstrapReport::default()
        };

        let loads = manifest.modules.iter().map(|info| self.load_module(info));
        let loaded = join_all(loads).await;

        for (info, outcome) in manifest.modules.iter().zip(loaded) {
            let registered = outcome.and_then(|module| self.registry.register(&info.url, module));
            match registered {
                Ok(()) => report.registered += 1,
                Err(e) => {
                    error!(module = %info.name, id = %info.id, error = %e, "Module load failed");
                    report.skipped.push(info.id.clone());
                }
            }
        }

        if self.registry.is_empty() {
            warn!("No modules registered");
            self.registry.ready().mark_ready();
        } else {
            let outcome = self.registry.init_all().await;
            report.initialized = outcome.initialized;
            report.failed = outcome.failed;
        }

        info!(
            listed = report.listed,
            registered = report.registered,
            skipped = report.skipped.len(),
            "Bootstrap complete"
        );
        Ok(report)
    }

    async fn load_module(&self, info: &ModuleInfo) -> Result<Arc<dyn Module>> {
        if !self.catalog.contains(&info.id) {
            return Err(Error::Module {
                id: info.id.clone(),
                message: "not available in this build".to_string(),
            });
        }

        info!(module = %info.name, "Loading module");
        let cache_key = format!("{}{}", MODULE_CACHE_KEY_PREFIX, info.id);
        let body = self
            .resources
            .fetch_with_cache(&info.url, &cache_key)
            .await
            .map_err(|e| Error::Module {
                id: info.id.clone(),
                message: e.to_string(),
            })?;

        let module = self.catalog.instantiate(&ModuleSource {
            info: info.clone(),
            body,
        })?;
        info!(module = %info.name, "Module loaded");
        Ok(module)
    }
}
