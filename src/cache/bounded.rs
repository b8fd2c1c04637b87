//! Indexed Bounded Store Module
//!
//! Per-key TTL entries plus a persisted write-order index that caps how many
//! entries a namespace may keep.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheIndex, Lookup, TtlCache};
use crate::error::Result;

// == Namespace ==
/// A logical group of keys sharing one index and one capacity.
///
/// Entry keys are `"<name>:<key>"` and the index lives under `"<name>#index"`,
/// so no logical key can collide with the index. `%`, `:` and `#` in the name
/// are percent-escaped in the stored prefix, so the first `:` or `#` of a
/// stored key always ends the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    name: String,
    prefix: String,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let prefix = name
            .replace('%', "%25")
            .replace(':', "%3A")
            .replace('#', "%23");
        Self { name, prefix }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    pub fn index_key(&self) -> String {
        format!("{}#index", self.prefix)
    }
}

/// Outcome of a reconcile sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Index entries that are still live
    pub kept: usize,
    /// Index entries dropped as expired, corrupt or missing
    pub removed: usize,
}

// == Indexed Bounded Store ==
/// Bounded persistent cache with write-order eviction.
///
/// Invariant: after every `put` a namespace index holds at most
/// `max_entries` keys, and every evicted key's entry has been deleted.
///
/// Index read-modify-write cycles are serialized by a lock shared between
/// clones, so concurrent writers never drop each other's keys. Every writer
/// of an index must go through the same instance or one of its clones.
#[derive(Clone)]
pub struct IndexedBoundedStore {
    cache: TtlCache,
    max_entries: usize,
    index_lock: Arc<Mutex<()>>,
}

impl IndexedBoundedStore {
    // == Constructor ==
    pub fn new(cache: TtlCache, max_entries: usize) -> Self {
        Self {
            cache,
            max_entries,
            index_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// The per-key TTL cache entries are stored through.
    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    // == Get ==
    /// Reads `key` from `ns`. A purged entry is also dropped from the index,
    /// best-effort.
    pub fn get<T: DeserializeOwned>(&self, ns: &Namespace, key: &str) -> Lookup<T> {
        let lookup = self.cache.get(&ns.entry_key(key));
        if matches!(lookup, Lookup::Purged) {
            if let Err(e) = self.unindex(ns, key) {
                debug!(namespace = %ns.name(), key = %key, error = %e, "Index cleanup failed");
            }
        }
        lookup
    }

    // == Put ==
    /// Writes `key` into `ns`, moves it to the newest index position and
    /// evicts oldest-written keys until the capacity holds.
    ///
    /// Returns the evicted keys.
    pub fn put<T: Serialize>(&self, ns: &Namespace, key: &str, data: &T) -> Result<Vec<String>> {
        let _index = self.index_lock.lock();
        self.cache.set(&ns.entry_key(key), data)?;

        let store = self.cache.store().as_ref();
        let index_key = ns.index_key();
        let mut index = CacheIndex::load(store, &index_key)?;
        index.touch(key);

        let mut evicted = Vec::new();
        while index.len() > self.max_entries {
            let Some(oldest) = index.evict_oldest() else {
                break;
            };
            if let Err(e) = self.cache.delete(&ns.entry_key(&oldest)) {
                warn!(namespace = %ns.name(), key = %oldest, error = %e, "Failed to delete evicted entry");
            }
            evicted.push(oldest);
        }

        index.save(store, &index_key)?;
        if !evicted.is_empty() {
            debug!(namespace = %ns.name(), evicted = ?evicted, "Evicted oldest entries");
        }
        Ok(evicted)
    }

    // == Remove ==
    /// Deletes `key` and drops it from the index.
    pub fn remove(&self, ns: &Namespace, key: &str) -> Result<()> {
        let _index = self.index_lock.lock();
        self.cache.delete(&ns.entry_key(key))?;
        self.unindex_locked(ns, key)
    }

    // == Reconcile ==
    /// Sweeps the index once, deleting expired or corrupt entries and
    /// dropping keys whose entry is missing, then rewrites the index with
    /// the survivors in their original order.
    pub fn reconcile(&self, ns: &Namespace) -> Result<ReconcileReport> {
        let _index = self.index_lock.lock();
        let store = self.cache.store().as_ref();
        let index_key = ns.index_key();
        let index = CacheIndex::load(store, &index_key)?;

        let mut survivors = CacheIndex::new();
        let mut removed = 0;
        for key in index.keys() {
            let entry_key = ns.entry_key(key);
            let live = match self.cache.timestamp(&entry_key) {
                Ok(Some(timestamp)) => self.cache.is_fresh(timestamp),
                Ok(None) => false,
                Err(e) => {
                    debug!(key = %entry_key, error = %e, "Unreadable entry during reconcile");
                    false
                }
            };

            if live {
                survivors.touch(key);
            } else {
                if let Err(e) = self.cache.delete(&entry_key) {
                    warn!(key = %entry_key, error = %e, "Failed to delete stale entry");
                }
                removed += 1;
            }
        }

        survivors.save(store, &index_key)?;
        let report = ReconcileReport {
            kept: survivors.len(),
            removed,
        };
        info!(
            namespace = %ns.name(),
            kept = report.kept,
            removed = report.removed,
            "Cache reconcile complete"
        );
        Ok(report)
    }

    // == Clear ==
    /// Deletes every indexed entry of `ns` and empties its index.
    pub fn clear(&self, ns: &Namespace) -> Result<usize> {
        let _index = self.index_lock.lock();
        let store = self.cache.store().as_ref();
        let index_key = ns.index_key();
        let index = CacheIndex::load(store, &index_key)?;
        for key in index.keys() {
            if let Err(e) = self.cache.delete(&ns.entry_key(key)) {
                warn!(namespace = %ns.name(), key = %key, error = %e, "Failed to delete entry");
            }
        }
        CacheIndex::new().save(store, &index_key)?;
        Ok(index.len())
    }

    // == Length ==
    pub fn len(&self, ns: &Namespace) -> Result<usize> {
        Ok(self.index(ns)?.len())
    }

    pub fn index(&self, ns: &Namespace) -> Result<CacheIndex> {
        CacheIndex::load(self.cache.store().as_ref(), &ns.index_key())
    }

    fn unindex(&self, ns: &Namespace, key: &str) -> Result<()> {
        let _index = self.index_lock.lock();
        self.unindex_locked(ns, key)
    }

    fn unindex_locked(&self, ns: &Namespace, key: &str) -> Result<()> {
        let store = self.cache.store().as_ref();
        let index_key = ns.index_key();
        let mut index = CacheIndex::load(store, &index_key)?;
        if index.remove(key) {
            index.save(store, &index_key)?;
        }
        Ok(())
    }
}
