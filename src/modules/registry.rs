//! Module Registry
//!
//! Holds registered modules and runs their `init` hooks once per session.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, warn};

use super::{Module, ReadySignal};
use crate::error::{Error, Result};
use crate::store::Settings;

/// Outcome of a module's `init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum InitStatus {
    Pending,
    Ok,
    Failed(String),
    Disabled,
}

/// A registered module. `enabled` is read once at registration.
#[derive(Clone)]
pub struct ModuleDescriptor {
    pub id: String,
    pub name: String,
    pub url: String,
    pub enabled: bool,
    pub status: InitStatus,
    pub module: Arc<dyn Module>,
}

/// Serializable view of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    pub id: String,
    pub name: String,
    pub url: String,
    pub enabled: bool,
    pub status: InitStatus,
}

impl From<&ModuleDescriptor> for ModuleSummary {
    fn from(d: &ModuleDescriptor) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            url: d.url.clone(),
            enabled: d.enabled,
            status: d.status.clone(),
        }
    }
}

/// Counts from one `init_all` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitOutcome {
    pub initialized: usize,
    pub failed: usize,
}

// == Module Registry ==
pub struct ModuleRegistry {
    settings: Settings,
    modules: Mutex<IndexMap<String, ModuleDescriptor>>,
    ready: ReadySignal,
    started: AtomicBool,
}

impl ModuleRegistry {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            modules: Mutex::new(IndexMap::new()),
            ready: ReadySignal::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ready(&self) -> &ReadySignal {
        &self.ready
    }

    // == Register ==
    /// Registers `module`, reading its enablement flag from settings.
    pub fn register(&self, url: &str, module: Arc<dyn Module>) -> Result<()> {
        let id = module.id().to_string();
        if id.is_empty() {
            return Err(Error::InvalidRequest("module id cannot be empty".to_string()));
        }

        let descriptor = ModuleDescriptor {
            name: module.name().to_string(),
            url: url.to_string(),
            enabled: self.settings.module_enabled(&id),
            status: InitStatus::Pending,
            module,
            id: id.clone(),
        };
        info!(module = %descriptor.name, id = %id, enabled = descriptor.enabled, "Module registered");
        self.modules.lock().insert(id, descriptor);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.modules.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.lock().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<ModuleDescriptor> {
        self.modules.lock().get(id).cloned()
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<ModuleDescriptor> {
        self.modules.lock().values().cloned().collect()
    }

    pub fn summaries(&self) -> Vec<ModuleSummary> {
        self.modules.lock().values().map(ModuleSummary::from).collect()
    }

    // == Init All ==
    /// Runs `init` for every enabled module concurrently.
    ///
    /// An error or panic in one module is logged and recorded without
    /// affecting the others. Readiness is signalled after every init has
    /// settled. Only the first call does any work.
    pub async fn init_all(&self) -> InitOutcome {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Modules already initialized");
            return InitOutcome::default();
        }

        let enabled: Vec<(String, String, Arc<dyn Module>)> = {
            let mut modules = self.modules.lock();
            modules
                .values_mut()
                .filter_map(|d| {
                    if d.enabled {
                        Some((d.id.clone(), d.name.clone(), Arc::clone(&d.module)))
                    } else {
                        d.status = InitStatus::Disabled;
                        None
                    }
                })
                .collect()
        };
        info!(count = enabled.len(), "Initializing enabled modules");

        let runs = enabled.into_iter().map(|(id, name, module)| async move {
            let result = AssertUnwindSafe(module.init()).catch_unwind().await;
            let status = match result {
                Ok(Ok(())) => {
                    info!(module = %name, "Module initialized");
                    InitStatus::Ok
                }
                Ok(Err(e)) => {
                    error!(module = %name, error = %e, "Module init failed");
                    InitStatus::Failed(e.to_string())
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(module = %name, panic = %message, "Module init panicked");
                    InitStatus::Failed(message)
                }
            };
            (id, status)
        });
        let statuses = join_all(runs).await;

        let mut outcome = InitOutcome::default();
        {
            let mut modules = self.modules.lock();
            for (id, status) in statuses {
                if status == InitStatus::Ok {
                    outcome.initialized += 1;
                } else {
                    outcome.failed += 1;
                }
                if let Some(d) = modules.get_mut(&id) {
                    d.status = status;
                }
            }
        }

        self.ready.mark_ready();
        info!(
            initialized = outcome.initialized,
            failed = outcome.failed,
            "All modules initialized"
        );
        outcome
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
