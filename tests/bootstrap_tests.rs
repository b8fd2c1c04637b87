//! Integration Tests for Module Bootstrap
//!
//! Drives a full manifest -> load -> register -> init cycle against a stub
//! HTTP fetcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use nsaide::cache::TtlCache;
use nsaide::fetch::{FetchRequest, FetchResponse, HttpFetcher, RemoteResources};
use nsaide::modules::{
    Bootstrap, InitStatus, Module, ModuleCatalog, ModuleRegistry, CONFIG_CACHE_KEY,
    MODULE_CACHE_KEY_PREFIX,
};
use nsaide::store::{KeyValueStore, MemoryStore, Settings};
use nsaide::Error;

// == Helpers ==

const CONFIG_URL: &str = "https://cdn.test/config.json";

/// Serves fixed bodies by URL, ignoring the cache-busting query.
#[derive(Default)]
struct RouteFetcher {
    routes: HashMap<String, (u16, String)>,
    requested: Mutex<Vec<String>>,
}

impl RouteFetcher {
    fn route(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(url.to_string(), (status, body.to_string()));
        self
    }

    fn requests_for(&self, url: &str) -> usize {
        self.requested.lock().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl HttpFetcher for RouteFetcher {
    async fn fetch(&self, request: FetchRequest) -> nsaide::Result<FetchResponse> {
        let base = request.url.split('?').next().unwrap_or_default().to_string();
        self.requested.lock().push(base.clone());
        let (status, body) = self
            .routes
            .get(&base)
            .cloned()
            .unwrap_or((404, String::new()));
        Ok(FetchResponse { status, body })
    }
}

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Fail,
    Panic,
}

struct TestModule {
    id: String,
    behavior: Behavior,
    inits: AtomicUsize,
}

impl TestModule {
    fn new(id: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            behavior,
            inits: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Module for TestModule {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    async fn init(&self) -> anyhow::Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => anyhow::bail!("{} refused to start", self.id),
            Behavior::Panic => panic!("{} exploded", self.id),
        }
    }
}

fn manifest(ids: &[&str]) -> String {
    let modules: Vec<String> = ids
        .iter()
        .map(|id| {
            format!(
                r#"{{"id":"{id}","name":"{id}","url":"https://cdn.test/{id}.js"}}"#,
                id = id
            )
        })
        .collect();
    format!(r#"{{"modules":[{}]}}"#, modules.join(","))
}

fn module_url(id: &str) -> String {
    format!("https://cdn.test/{}.js", id)
}

fn fetcher_for(ids: &[&str]) -> RouteFetcher {
    ids.iter().fold(
        RouteFetcher::default().route(CONFIG_URL, 200, &manifest(ids)),
        |f, id| f.route(&module_url(id), 200, "// module source"),
    )
}

struct Harness {
    store: Arc<MemoryStore>,
    fetcher: Arc<RouteFetcher>,
    registry: Arc<ModuleRegistry>,
}

impl Harness {
    fn new(store: Arc<MemoryStore>, fetcher: RouteFetcher) -> Self {
        Self {
            registry: Arc::new(ModuleRegistry::new(Settings::new(store.clone()))),
            store,
            fetcher: Arc::new(fetcher),
        }
    }

    fn bootstrap(&self, catalog: ModuleCatalog) -> Bootstrap {
        let cache = TtlCache::new(self.store.clone(), Duration::from_secs(1800));
        let resources = RemoteResources::new(cache, self.fetcher.clone());
        Bootstrap::new(resources, self.registry.clone(), catalog, CONFIG_URL)
    }
}

// == Bootstrap Tests ==

#[tokio::test]
async fn test_bootstrap_initializes_listed_modules() {
    let a = TestModule::new("a", Behavior::Succeed);
    let b = TestModule::new("b", Behavior::Succeed);
    let harness = Harness::new(Arc::new(MemoryStore::new()), fetcher_for(&["a", "b"]));
    let catalog = ModuleCatalog::new()
        .with_instance(a.clone())
        .with_instance(b.clone());

    let report = harness.bootstrap(catalog).run().await.unwrap();

    assert_eq!(report.listed, 2);
    assert_eq!(report.registered, 2);
    assert_eq!(report.initialized, 2);
    assert!(report.skipped.is_empty());
    assert_eq!(a.inits.load(Ordering::SeqCst), 1);
    assert_eq!(b.inits.load(Ordering::SeqCst), 1);
    assert!(harness.registry.ready().is_ready());
    assert_eq!(harness.registry.get("a").unwrap().status, InitStatus::Ok);
}

#[tokio::test]
async fn test_bootstrap_caches_manifest_and_module_sources() {
    let store = Arc::new(MemoryStore::new());
    let first = Harness::new(store.clone(), fetcher_for(&["a"]));
    first
        .bootstrap(ModuleCatalog::new().with_instance(TestModule::new("a", Behavior::Succeed)))
        .run()
        .await
        .unwrap();

    assert!(store.contains(CONFIG_CACHE_KEY));
    assert!(store.contains(&format!("{}a", MODULE_CACHE_KEY_PREFIX)));

    // a later session over the same store loads without the network
    let second = Harness::new(store, fetcher_for(&["a"]));
    let report = second
        .bootstrap(ModuleCatalog::new().with_instance(TestModule::new("a", Behavior::Succeed)))
        .run()
        .await
        .unwrap();

    assert_eq!(report.initialized, 1);
    assert!(second.fetcher.requested.lock().is_empty());
}

#[tokio::test]
async fn test_unknown_module_is_skipped_without_fetch() {
    let harness = Harness::new(Arc::new(MemoryStore::new()), fetcher_for(&["a", "ghost"]));
    let catalog = ModuleCatalog::new().with_instance(TestModule::new("a", Behavior::Succeed));

    let report = harness.bootstrap(catalog).run().await.unwrap();

    assert_eq!(report.registered, 1);
    assert_eq!(report.skipped, vec!["ghost".to_string()]);
    assert_eq!(harness.fetcher.requests_for(&module_url("ghost")), 0);
    assert!(harness.registry.get("ghost").is_none());
}

#[tokio::test]
async fn test_unreachable_module_source_is_skipped() {
    let fetcher = RouteFetcher::default()
        .route(CONFIG_URL, 200, &manifest(&["a", "b"]))
        .route(&module_url("a"), 200, "// ok")
        .route(&module_url("b"), 503, "");
    let harness = Harness::new(Arc::new(MemoryStore::new()), fetcher);
    let catalog = ModuleCatalog::new()
        .with_instance(TestModule::new("a", Behavior::Succeed))
        .with_instance(TestModule::new("b", Behavior::Succeed));

    let report = harness.bootstrap(catalog).run().await.unwrap();

    assert_eq!(report.skipped, vec!["b".to_string()]);
    assert_eq!(report.initialized, 1);
    assert!(harness.registry.ready().is_ready());
}

#[tokio::test]
async fn test_failing_modules_do_not_affect_others() {
    let good = TestModule::new("good", Behavior::Succeed);
    let harness = Harness::new(
        Arc::new(MemoryStore::new()),
        fetcher_for(&["bad", "good", "boom"]),
    );
    let catalog = ModuleCatalog::new()
        .with_instance(TestModule::new("bad", Behavior::Fail))
        .with_instance(good.clone())
        .with_instance(TestModule::new("boom", Behavior::Panic));

    let report = harness.bootstrap(catalog).run().await.unwrap();

    assert_eq!(report.initialized, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(good.inits.load(Ordering::SeqCst), 1);
    assert!(matches!(
        harness.registry.get("bad").unwrap().status,
        InitStatus::Failed(ref msg) if msg.contains("refused")
    ));
    assert!(matches!(
        harness.registry.get("boom").unwrap().status,
        InitStatus::Failed(ref msg) if msg.contains("exploded")
    ));
    assert!(harness.registry.ready().is_ready());
}

#[tokio::test]
async fn test_disabled_module_is_registered_but_not_initialized() {
    let store = Arc::new(MemoryStore::new());
    Settings::new(store.clone())
        .set_module_enabled("a", false)
        .unwrap();
    let a = TestModule::new("a", Behavior::Succeed);
    let harness = Harness::new(store, fetcher_for(&["a"]));

    harness
        .bootstrap(ModuleCatalog::new().with_instance(a.clone()))
        .run()
        .await
        .unwrap();

    let descriptor = harness.registry.get("a").unwrap();
    assert!(!descriptor.enabled);
    assert_eq!(descriptor.status, InitStatus::Disabled);
    assert_eq!(a.inits.load(Ordering::SeqCst), 0);
    assert!(harness.registry.ready().is_ready());
}

#[tokio::test]
async fn test_manifest_failure_aborts_bootstrap() {
    let fetcher = RouteFetcher::default().route(CONFIG_URL, 500, "");
    let harness = Harness::new(Arc::new(MemoryStore::new()), fetcher);

    let result = harness.bootstrap(ModuleCatalog::new()).run().await;

    assert!(matches!(result, Err(Error::Manifest(_))));
    assert!(harness.registry.is_empty());
    assert!(!harness.registry.ready().is_ready());
    assert!(!harness.store.contains(CONFIG_CACHE_KEY));
}

#[tokio::test]
async fn test_malformed_manifest_aborts_bootstrap() {
    let fetcher = RouteFetcher::default().route(CONFIG_URL, 200, "not json");
    let harness = Harness::new(Arc::new(MemoryStore::new()), fetcher);

    let result = harness.bootstrap(ModuleCatalog::new()).run().await;

    assert!(matches!(result, Err(Error::Manifest(_))));
}

#[tokio::test]
async fn test_empty_manifest_still_signals_ready() {
    let harness = Harness::new(Arc::new(MemoryStore::new()), fetcher_for(&[]));

    let report = harness.bootstrap(ModuleCatalog::new()).run().await.unwrap();

    assert_eq!(report.listed, 0);
    harness
        .registry
        .ready()
        .wait(Duration::from_millis(10))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_waiter_released_by_background_bootstrap() {
    let harness = Harness::new(Arc::new(MemoryStore::new()), fetcher_for(&["a"]));
    let bootstrap =
        harness.bootstrap(ModuleCatalog::new().with_instance(TestModule::new("a", Behavior::Succeed)));

    let waiter = {
        let registry = harness.registry.clone();
        tokio::spawn(async move { registry.ready().wait(Duration::from_secs(5)).await })
    };
    tokio::spawn(async move { bootstrap.run().await });

    waiter.await.unwrap().unwrap();
    assert_eq!(harness.registry.get("a").unwrap().status, InitStatus::Ok);
}

#[tokio::test]
async fn test_wait_times_out_without_bootstrap() {
    let registry = ModuleRegistry::new(Settings::new(Arc::new(MemoryStore::new())));

    let result = registry.ready().wait(Duration::from_millis(20)).await;

    assert!(matches!(result, Err(Error::Timeout(_))));
}

#[tokio::test]
async fn test_settings_flag_read_through_store_trait() {
    let store = Arc::new(MemoryStore::new());
    Settings::new(store.clone())
        .set_module_enabled("userDataService", false)
        .unwrap();

    assert_eq!(
        store.get("module_userDataService_enabled").unwrap().as_deref(),
        Some("false")
    );
}
