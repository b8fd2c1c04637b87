//! Cache Index Module
//!
//! Write-order bookkeeping for a persistent cache namespace.

use std::collections::VecDeque;

use tracing::warn;

use crate::error::Result;
use crate::store::KeyValueStore;

// == Cache Index ==
/// Ordered keys of one namespace, by last write.
///
/// Keys are stored in a VecDeque where:
/// - Front = Least recently written (evicted first)
/// - Back = Most recently written
///
/// Reads never reorder the index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheIndex {
    order: VecDeque<String>,
}

impl CacheIndex {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: keys.into_iter().map(Into::into).collect(),
        }
    }

    // == Load ==
    /// Reads the index stored under `index_key`.
    ///
    /// A corrupt stored index is treated as empty; store failures surface.
    pub fn load(store: &dyn KeyValueStore, index_key: &str) -> Result<Self> {
        let Some(raw) = store.get(index_key)? else {
            return Ok(Self::new());
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(keys) => Ok(Self::from_keys(keys)),
            Err(e) => {
                warn!(index_key = %index_key, error = %e, "Discarding corrupt cache index");
                Ok(Self::new())
            }
        }
    }

    // == Save ==
    pub fn save(&self, store: &dyn KeyValueStore, index_key: &str) -> Result<()> {
        let raw = serde_json::to_string(&self.order)?;
        store.set(index_key, &raw)
    }

    // == Touch ==
    /// Marks a key as most recently written (moves to back).
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Removes a key, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.order.len();
        self.order.retain(|k| k != key);
        self.order.len() != before
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently written key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }

    /// Keys from oldest to newest write.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_touch_appends_new_keys() {
        let mut index = CacheIndex::new();
        index.touch("a");
        index.touch("b");
        index.touch("c");

        assert_eq!(index.to_vec(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_touch_existing_moves_to_end() {
        let mut index = CacheIndex::from_keys(["b", "c", "d"]);
        index.touch("b");

        assert_eq!(index.to_vec(), vec!["c", "d", "b"]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_evict_oldest_from_front() {
        let mut index = CacheIndex::from_keys(["a", "b"]);
        assert_eq!(index.evict_oldest(), Some("a".to_string()));
        assert_eq!(index.evict_oldest(), Some("b".to_string()));
        assert_eq!(index.evict_oldest(), None);
    }

    #[test]
    fn test_remove_reports_presence() {
        let mut index = CacheIndex::from_keys(["a", "b"]);
        assert!(index.remove("a"));
        assert!(!index.remove("nonexistent"));
        assert_eq!(index.to_vec(), vec!["b"]);
    }

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        let index = CacheIndex::from_keys(["u1", "u2"]);
        index.save(&store, "idx").unwrap();

        assert_eq!(store.get("idx").unwrap().as_deref(), Some(r#"["u1","u2"]"#));
        assert_eq!(CacheIndex::load(&store, "idx").unwrap(), index);
    }

    #[test]
    fn test_load_corrupt_is_empty() {
        let store = MemoryStore::new();
        store.set("idx", "[1, 2").unwrap();
        assert!(CacheIndex::load(&store, "idx").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_is_empty() {
        let store = MemoryStore::new();
        assert!(CacheIndex::load(&store, "idx").unwrap().is_empty());
    }
}
