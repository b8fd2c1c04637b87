//! Cache Entry Module
//!
//! Defines the stored shape of a cached value with its write timestamp.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached value and the Unix millisecond timestamp it was written at.
///
/// This is also the serialized form of every persistent entry:
/// `{"data": ..., "timestamp": 1700000000000}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    pub fn new(data: T, timestamp: u64) -> Self {
        Self { data, timestamp }
    }

    // == Is Valid ==
    /// Checks whether the entry is still fresh at `now_ms`.
    ///
    /// Boundary condition: an entry whose age equals the TTL exactly is still
    /// valid; it becomes invalid once the age exceeds the TTL. Timestamps in
    /// the future count as age zero.
    pub fn is_valid(&self, ttl: Duration, now_ms: u64) -> bool {
        self.age_ms(now_ms) <= ttl.as_millis() as u64
    }

    /// Milliseconds elapsed since the entry was written.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }
}
