//! nsaide - forum helper
//!
//! Loads modules from the remote manifest and serves a small admin API over
//! the user data cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nsaide::api::{create_router, AppState};
use nsaide::cache::TtlCache;
use nsaide::config::Config;
use nsaide::fetch::{HttpFetcher, RemoteResources, ReqwestFetcher};
use nsaide::modules::{Bootstrap, ModuleCatalog, ModuleRegistry};
use nsaide::store::{FileStore, KeyValueStore, MemoryStore, Settings};
use nsaide::tasks::spawn_reconcile_task;
use nsaide::users::UserDataService;

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the durable store and build the services
/// 4. Bootstrap modules from the manifest and wait for readiness
/// 5. Start the reconcile task and the admin HTTP server
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nsaide=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting nsaide");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_expiry={}s, max_memory={}, max_storage={}, port={}, reconcile_interval={}s",
        config.cache_expiry,
        config.max_memory_entries,
        config.max_storage_entries,
        config.server_port,
        config.reconcile_interval
    );

    let store = open_store(&config);
    let fetcher: Arc<dyn HttpFetcher> = Arc::new(
        ReqwestFetcher::new(config.forum_cookie.clone()).context("failed to build HTTP client")?,
    );

    let user_data = Arc::new(UserDataService::new(store.clone(), fetcher.clone(), &config));
    let registry = Arc::new(ModuleRegistry::new(Settings::new(store.clone())));
    let catalog = ModuleCatalog::new().with_instance(user_data.clone());
    let resources = RemoteResources::new(TtlCache::new(store.clone(), config.ttl()), fetcher);

    let bootstrap = Bootstrap::new(resources, registry.clone(), catalog, config.config_url.clone());
    tokio::spawn(async move {
        match bootstrap.run().await {
            Ok(report) => info!(?report, "Modules bootstrapped"),
            Err(e) => error!(error = %e, "Initialization failed"),
        }
    });

    if let Err(e) = registry.ready().wait(config.ready_timeout()).await {
        warn!(error = %e, "Modules not ready, serving anyway");
    }

    let reconcile_handle = (config.reconcile_interval > 0)
        .then(|| spawn_reconcile_task(user_data.clone(), config.reconcile_interval));

    let app = create_router(AppState::new(user_data, registry));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(reconcile_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Opens the file store, falling back to a session-only store.
fn open_store(config: &Config) -> Arc<dyn KeyValueStore> {
    match FileStore::open(&config.store_path) {
        Ok(store) => {
            info!(path = %config.store_path, "Store opened");
            Arc::new(store)
        }
        Err(e) => {
            warn!(path = %config.store_path, error = %e, "Store unavailable, using memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the reconcile task and allows graceful shutdown.
async fn shutdown_signal(reconcile_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = reconcile_handle {
        handle.abort();
        warn!("Reconcile task aborted");
    }
}
