//! Cache Module
//!
//! Two-tier TTL caching over a key-value store: expiring per-key entries,
//! bounded namespaces with write-order eviction, and request coalescing.

mod bounded;
mod clock;
mod coalescer;
mod entry;
mod index;
mod lookup;
mod memory;
mod stats;
mod ttl;


// Re-export public types
pub use bounded::{IndexedBoundedStore, Namespace, ReconcileReport};
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use coalescer::RequestCoalescer;
pub use entry::CacheEntry;
pub use index::CacheIndex;
pub use lookup::Lookup;
pub use memory::MemoryCache;
pub use stats::CacheStats;
pub use ttl::TtlCache;
