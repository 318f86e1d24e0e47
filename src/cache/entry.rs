//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A single stored value together with the moment it was inserted and its TTL.
///
/// Entries are never mutated in place; an overwrite replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub data: V,
    /// Insertion instant
    pub inserted_at: Instant,
    /// Maximum age before the entry is treated as absent
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current instant.
    pub fn new(data: V, ttl: Duration) -> Self {
        Self {
            data,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    // == Age ==
    /// Time elapsed since insertion.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.inserted_at)
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry expires once its age strictly exceeds its TTL, so an entry read
    /// exactly `ttl` after insertion is still served.
    pub fn is_expired(&self) -> bool {
        self.age() > self.ttl
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, `Duration::ZERO` once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.ttl.saturating_sub(self.age())
    }
}
