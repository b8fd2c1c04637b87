//! Request Coalescer Module
//!
//! Two-tier read-through cache that runs at most one fetch per key at a time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{
    CacheStats, IndexedBoundedStore, Lookup, MemoryCache, Namespace, ReconcileReport,
};
use crate::error::Result;

type SharedFetch<T> = Shared<BoxFuture<'static, Option<T>>>;

// == Request Coalescer ==
/// Memory tier, persistent tier and in-flight map for one namespace.
///
/// Lookups check memory, then the persistent store (promoting hits into
/// memory), then the in-flight map. Only when all three miss is the fetch
/// function invoked; its future runs as a detached task, so a caller that
/// stops awaiting does not cancel it and the result still populates both
/// tiers. Failures are never cached.
///
/// Cloning is cheap and shares all state.
pub struct RequestCoalescer<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RequestCoalescer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T> {
    namespace: Namespace,
    memory: Mutex<MemoryCache<T>>,
    storage: IndexedBoundedStore,
    pending: Mutex<HashMap<String, SharedFetch<T>>>,
    stats: Mutex<CacheStats>,
}

/// Removes the in-flight entry when the fetch task finishes, including by
/// panic.
struct PendingGuard<T> {
    inner: Arc<Inner<T>>,
    key: String,
}

impl<T> Drop for PendingGuard<T> {
    fn drop(&mut self) {
        self.inner.pending.lock().remove(&self.key);
    }
}

impl<T> RequestCoalescer<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a coalescer over `storage`. The memory tier shares the
    /// storage TTL and clock.
    pub fn new(namespace: Namespace, storage: IndexedBoundedStore, max_memory_entries: usize) -> Self {
        let ttl = storage.cache().ttl();
        let clock = Arc::clone(storage.cache().clock());
        Self {
            inner: Arc::new(Inner {
                namespace,
                memory: Mutex::new(MemoryCache::new(max_memory_entries, ttl, clock)),
                storage,
                pending: Mutex::new(HashMap::new()),
                stats: Mutex::new(CacheStats::new()),
            }),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.inner.namespace
    }

    // == Init ==
    /// Startup hook: sweeps stale persistent entries.
    pub fn init(&self) -> Result<ReconcileReport> {
        self.reconcile()
    }

    // == Load ==
    /// Returns the value for `key`, invoking `fetch` only if neither tier
    /// holds it and no fetch for `key` is already in flight.
    ///
    /// Callers only observe a value or `None`; fetch failures and cache
    /// faults are logged.
    pub async fn load<F, Fut>(&self, key: &str, fetch: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if key.is_empty() {
            warn!(namespace = %self.inner.namespace.name(), "Ignoring lookup with empty key");
            return None;
        }

        let cached = self.inner.memory.lock().get(key);
        if let Some(value) = cached {
            debug!(key = %key, "Memory cache hit");
            self.inner.stats.lock().record_memory_hit();
            return Some(value);
        }

        match self.inner.storage.get::<T>(&self.inner.namespace, key) {
            Lookup::Hit(value) => {
                debug!(key = %key, "Persistent cache hit");
                self.inner.stats.lock().record_storage_hit();
                self.inner.promote(key, value.clone());
                return Some(value);
            }
            Lookup::Failed(e) => {
                warn!(key = %key, error = %e, "Persistent cache read failed");
            }
            Lookup::Miss | Lookup::Purged => {}
        }

        self.join_or_start(key, fetch).await
    }

    fn join_or_start<F, Fut>(&self, key: &str, fetch: F) -> SharedFetch<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let joined = self.inner.pending.lock().get(key).cloned();
        if let Some(in_flight) = joined {
            debug!(key = %key, "Joining in-flight request");
            return in_flight;
        }

        // Built outside the lock: the closure may call back into this cache.
        let fut = fetch();

        let mut pending = self.inner.pending.lock();
        if let Some(in_flight) = pending.get(key) {
            debug!(key = %key, "Joining in-flight request");
            return in_flight.clone();
        }

        // A fetch that settled after the tier checks wrote both tiers
        // before leaving the in-flight map.
        if let Some(value) = self.inner.settled(key) {
            return future::ready(Some(value)).boxed().shared();
        }

        {
            let mut stats = self.inner.stats.lock();
            stats.record_miss();
            stats.record_fetch();
        }
        debug!(key = %key, "Starting fetch");

        let guard = PendingGuard {
            inner: Arc::clone(&self.inner),
            key: key.to_string(),
        };
        let handle = tokio::spawn(async move {
            let outcome = fut.await;
            // Store writes may touch the disk, keep them off the async workers.
            let settled = tokio::task::spawn_blocking(move || {
                let value = guard.inner.settle(&guard.key, outcome);
                drop(guard);
                value
            })
            .await;
            settled.unwrap_or_else(|e| {
                warn!(error = %e, "Settling fetch result failed");
                None
            })
        });

        let shared = async move {
            handle.await.unwrap_or_else(|e| {
                warn!(error = %e, "Fetch task did not complete");
                None
            })
        }
        .boxed()
        .shared();

        pending.insert(key.to_string(), shared.clone());
        shared
    }

    // == Stats ==
    /// Returns counters together with the current tier sizes.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.inner.stats.lock().clone();
        stats.memory_size = self.inner.memory.lock().len();
        stats.pending_requests = self.pending_count();
        stats.storage_size = self
            .inner
            .storage
            .len(&self.inner.namespace)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read cache index size");
                0
            });
        stats
    }

    /// Number of fetches currently in flight.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    // == Reconcile ==
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        self.inner.storage.reconcile(&self.inner.namespace)
    }

    // == Clear ==
    /// Empties both tiers, returning how many persistent entries were removed.
    pub fn clear(&self) -> Result<usize> {
        self.inner.memory.lock().clear();
        let removed = self.inner.storage.clear(&self.inner.namespace)?;
        info!(namespace = %self.inner.namespace.name(), removed, "Cleared cache");
        Ok(removed)
    }
}

impl<T> Inner<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn settle(&self, key: &str, outcome: Result<T>) -> Option<T> {
        match outcome {
            Ok(value) => {
                self.write_through(key, &value);
                Some(value)
            }
            Err(e) => {
                warn!(
                    namespace = %self.namespace.name(),
                    key = %key,
                    error = %e,
                    "Fetch failed, result not cached"
                );
                self.stats.lock().record_fetch_failure();
                None
            }
        }
    }

    /// Re-reads both tiers for a value written by a fetch that has already
    /// settled.
    fn settled(&self, key: &str) -> Option<T> {
        let cached = self.memory.lock().get(key);
        if let Some(value) = cached {
            self.stats.lock().record_memory_hit();
            return Some(value);
        }
        match self.storage.get::<T>(&self.namespace, key) {
            Lookup::Hit(value) => {
                self.stats.lock().record_storage_hit();
                self.promote(key, value.clone());
                Some(value)
            }
            _ => None,
        }
    }

    fn promote(&self, key: &str, value: T) {
        let evicted = self.memory.lock().insert(key, value);
        if let Some(evicted) = evicted {
            debug!(key = %evicted, "Evicted from memory tier");
            self.stats.lock().record_evictions(1);
        }
    }

    fn write_through(&self, key: &str, value: &T) {
        self.promote(key, value.clone());
        match self.storage.put(&self.namespace, key, value) {
            Ok(evicted) => self.stats.lock().record_evictions(evicted.len()),
            Err(e) => warn!(key = %key, error = %e, "Persistent cache write failed"),
        }
    }
}
