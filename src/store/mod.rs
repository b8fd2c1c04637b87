//! Store Module
//!
//! Durable key-value storage the caches are layered on. Setting an empty
//! string is the deletion convention; there is no separate delete primitive.

mod file;
mod memory;
mod settings;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use settings::Settings;

use crate::error::Result;

// == Key Value Store ==
/// Process-wide key to string store with no cross-key atomicity.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when absent or deleted.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`; an empty value deletes the key.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`.
    fn delete(&self, key: &str) -> Result<()> {
        self.set(key, "")
    }
}
