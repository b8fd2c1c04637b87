//! TTL Cache Module
//!
//! Expiring get/set over individual key-value store entries.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, Clock, Lookup, SystemClock};
use crate::error::Result;
use crate::store::KeyValueStore;

// == TTL Cache ==
/// Stores each value as a serialized [`CacheEntry`] under its own store key.
///
/// Writes are unconditional overwrites. There is no locking: under concurrent
/// writers the last `set` wins.
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    // == Constructor ==
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { store, ttl, clock }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    // == Get ==
    /// Reads the value stored under `key`.
    ///
    /// An entry that fails to decode or is older than the TTL is deleted and
    /// reported as [`Lookup::Purged`].
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Lookup::Miss,
            Err(e) => return Lookup::Failed(e),
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding corrupt cache entry");
                self.purge(key);
                return Lookup::Purged;
            }
        };

        let now = self.clock.now_ms();
        if !entry.is_valid(self.ttl, now) {
            debug!(key = %key, age_ms = entry.age_ms(now), "Cache entry expired");
            self.purge(key);
            return Lookup::Purged;
        }

        Lookup::Hit(entry.data)
    }

    // == Set ==
    /// Writes `data` under `key` stamped with the current time.
    pub fn set<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let entry = CacheEntry::new(data, self.clock.now_ms());
        let raw = serde_json::to_string(&entry)?;
        self.store.set(key, &raw)
    }

    // == Delete ==
    pub fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key)
    }

    /// Returns the write timestamp of the entry under `key` without decoding
    /// its payload. `Ok(None)` means absent; a decode failure is an error.
    pub(crate) fn timestamp(&self, key: &str) -> Result<Option<u64>> {
        match self.store.get(key)? {
            Some(raw) => {
                let entry: CacheEntry<serde::de::IgnoredAny> = serde_json::from_str(&raw)?;
                Ok(Some(entry.timestamp))
            }
            None => Ok(None),
        }
    }

    pub(crate) fn is_fresh(&self, timestamp: u64) -> bool {
        self.clock.now_ms().saturating_sub(timestamp) <= self.ttl.as_millis() as u64
    }

    fn purge(&self, key: &str) {
        if let Err(e) = self.store.delete(key) {
            warn!(key = %key, error = %e, "Failed to delete stale cache entry");
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::store::MemoryStore;

    const TTL: Duration = Duration::from_secs(1800);

    fn setup() -> (Arc<MemoryStore>, Arc<ManualClock>, TtlCache) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(1_000_000));
        let cache = TtlCache::with_clock(store.clone(), TTL, clock.clone());
        (store, clock, cache)
    }

    #[test]
    fn test_set_and_get() {
        let (_, _, cache) = setup();
        cache.set("ns_config_cache", &"{\"modules\":[]}".to_string()).unwrap();

        let value: Option<String> = cache.get("ns_config_cache").into_option();
        assert_eq!(value.as_deref(), Some("{\"modules\":[]}"));
    }

    #[test]
    fn test_get_missing_is_miss() {
        let (_, _, cache) = setup();
        assert!(matches!(cache.get::<String>("absent"), Lookup::Miss));
    }

    #[test]
    fn test_get_before_ttl_returns_value() {
        let (_, clock, cache) = setup();
        cache.set("k", &7u32).unwrap();
        clock.advance(TTL);
        assert!(matches!(cache.get::<u32>("k"), Lookup::Hit(7)));
    }

    #[test]
    fn test_get_after_ttl_purges_entry() {
        let (store, clock, cache) = setup();
        cache.set("k", &7u32).unwrap();
        clock.advance(TTL + Duration::from_millis(1));

        assert!(matches!(cache.get::<u32>("k"), Lookup::Purged));
        assert!(!store.contains("k"), "expired entry should be deleted");
        assert!(matches!(cache.get::<u32>("k"), Lookup::Miss));
    }

    #[test]
    fn test_corrupt_entry_is_purged() {
        let (store, _, cache) = setup();
        store.set("k", "{broken").unwrap();

        assert!(matches!(cache.get::<u32>("k"), Lookup::Purged));
        assert!(!store.contains("k"));
    }

    #[test]
    fn test_type_mismatch_is_purged() {
        let (store, _, cache) = setup();
        cache.set("k", &"text".to_string()).unwrap();

        assert!(matches!(cache.get::<u32>("k"), Lookup::Purged));
        assert!(!store.contains("k"));
    }

    #[test]
    fn test_overwrite_resets_timestamp() {
        let (_, clock, cache) = setup();
        cache.set("k", &1u32).unwrap();
        clock.advance(Duration::from_secs(1000));
        cache.set("k", &2u32).unwrap();
        clock.advance(Duration::from_secs(1000));

        assert!(matches!(cache.get::<u32>("k"), Lookup::Hit(2)));
    }

    #[test]
    fn test_timestamp_reads_without_payload_type() {
        let (_, _, cache) = setup();
        cache.set("k", &serde_json::json!({"member_id": 9})).unwrap();
        assert_eq!(cache.timestamp("k").unwrap(), Some(1_000_000));
        assert_eq!(cache.timestamp("absent").unwrap(), None);
    }
}
