//! Build-time catalog of available modules.

use std::collections::HashMap;
use std::sync::Arc;

use super::{Module, ModuleInfo};
use crate::error::{Error, Result};

/// A manifest entry together with the resource text loaded from its URL.
#[derive(Debug, Clone)]
pub struct ModuleSource {
    pub info: ModuleInfo,
    pub body: String,
}

/// Builds a module instance from its loaded source.
pub type ModuleFactory = Box<dyn Fn(&ModuleSource) -> Result<Arc<dyn Module>> + Send + Sync>;

/// Modules compiled into this build, keyed by manifest id.
///
/// The manifest only selects among these; nothing fetched at runtime is
/// ever executed.
#[derive(Default)]
pub struct ModuleCatalog {
    factories: HashMap<String, ModuleFactory>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory for `id`, replacing any previous one.
    pub fn with<F>(mut self, id: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ModuleSource) -> Result<Arc<dyn Module>> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
        self
    }

    /// Adds an already constructed module that ignores its source text.
    pub fn with_instance(self, module: Arc<dyn Module>) -> Self {
        let id = module.id().to_string();
        self.with(id, move |_| Ok(Arc::clone(&module)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn instantiate(&self, source: &ModuleSource) -> Result<Arc<dyn Module>> {
        let factory = self.factories.get(&source.info.id).ok_or_else(|| Error::Module {
            id: source.info.id.clone(),
            message: "not available in this build".to_string(),
        })?;
        factory(source)
    }
}
