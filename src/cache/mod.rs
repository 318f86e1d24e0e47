//! Cache Module
//!
//! In-memory caching with TTL expiration and size-bounded eviction.

mod entry;
mod order;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use order::{EvictionPolicy, KeyOrder};
pub use shared::SharedCache;
pub use stats::{CacheCounters, CacheStats};
pub use store::{CacheStore, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
