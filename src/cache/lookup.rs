//! Tagged outcome of a cache read.

use crate::error::Error;

/// Result of reading one cache entry.
///
/// Corrupt and expired entries are both reported as `Purged`: the stored
/// value has already been deleted and the caller should behave as on a miss.
#[derive(Debug)]
pub enum Lookup<T> {
    /// A fresh value was found
    Hit(T),
    /// Nothing was stored
    Miss,
    /// A stale or undecodable value was found and deleted
    Purged,
    /// The underlying store failed
    Failed(Error),
}

impl<T> Lookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// Collapses the outcome to value-or-absent.
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Hit(value) => Some(value),
            _ => None,
        }
    }
}
