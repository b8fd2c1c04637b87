//! Memory Cache Module
//!
//! Bounded in-process tier with insertion-order eviction and TTL expiry.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;

use crate::cache::{CacheEntry, Clock};

// == Memory Cache ==
/// In-memory tier keyed by string.
///
/// When a new key is inserted at capacity the earliest-inserted key is
/// evicted. Reads do not refresh position, and overwriting an existing key
/// keeps its original position while resetting its timestamp.
pub struct MemoryCache<T> {
    entries: IndexMap<String, CacheEntry<T>>,
    max_entries: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> MemoryCache<T> {
    // == Constructor ==
    pub fn new(max_entries: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: IndexMap::new(),
            max_entries,
            ttl,
            clock,
        }
    }

    // == Get ==
    /// Returns a clone of the fresh value under `key`; expired entries are
    /// removed.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();
        let valid = self.entries.get(key)?.is_valid(self.ttl, now);
        if !valid {
            self.entries.shift_remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.data.clone())
    }

    // == Insert ==
    /// Stores `data` under `key`, returning the key evicted to make room.
    pub fn insert(&mut self, key: &str, data: T) -> Option<String> {
        let entry = CacheEntry::new(data, self.clock.now_ms());
        if let Some(existing) = self.entries.get_mut(key) {
            *existing = entry;
            return None;
        }

        let mut evicted = None;
        if self.entries.len() >= self.max_entries {
            evicted = self.entries.shift_remove_index(0).map(|(k, _)| k);
        }
        if self.max_entries > 0 {
            self.entries.insert(key.to_string(), entry);
        }
        evicted
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.entries.shift_remove(key).map(|entry| entry.data)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys from earliest to latest insertion.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
