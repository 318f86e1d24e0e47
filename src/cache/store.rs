//! Cache Store Module
//!
//! Bounded key/value storage with per-entry TTL and insertion-order eviction.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, trace};

use crate::cache::{CacheCounters, CacheEntry, CacheStats, EvictionPolicy, KeyOrder};
use crate::config::Config;

// == Defaults ==
/// Default capacity
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default TTL applied when `set` is called without one
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

// == Cache Store ==
/// Main cache storage with TTL expiry and bounded size.
///
/// `get` takes `&mut self`: expired entries are removed when they are read.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Eviction order tracker
    order: KeyOrder,
    policy: EvictionPolicy,
    counters: CacheCounters,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL)
    }
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new store with FIFO eviction.
    ///
    /// A `max_entries` of zero is raised to one.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self::with_policy(max_entries, default_ttl, EvictionPolicy::Fifo)
    }

    /// Creates a new store with an explicit eviction policy.
    pub fn with_policy(max_entries: usize, default_ttl: Duration, policy: EvictionPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            order: KeyOrder::new(),
            policy,
            counters: CacheCounters::default(),
            max_entries: max_entries.max(1),
            default_ttl,
        }
    }

    /// Creates a store sized and configured from `Config`.
    pub fn from_config(config: &Config) -> Self {
        Self::with_policy(config.max_entries, config.default_ttl, config.eviction)
    }

    // == Set ==
    /// Stores a value, replacing any previous entry under the same key.
    ///
    /// Expired entries are swept first. If the store is still full, the oldest
    /// entry is evicted, even when `key` is already present.
    ///
    /// Under FIFO an overwritten key keeps its original insertion position;
    /// under LRU the write moves it to the newest position.
    pub fn set(&mut self, key: impl Into<String>, data: V, ttl: Option<Duration>) {
        let key = key.into();
        self.purge_expired();

        if self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.order.pop_oldest() {
                self.entries.remove(&evicted);
                self.counters.record_eviction();
                debug!(key = %evicted, policy = %self.policy, "Evicted cache entry");
            }
        }

        let entry = CacheEntry::new(data, ttl.unwrap_or(self.default_ttl));
        self.entries.insert(key.clone(), entry);
        if self.policy.promotes_on_read() {
            self.order.touch(&key);
        } else {
            self.order.insert(&key);
        }
    }

    // == Lookup ==
    /// Shared read path for `get` and `has`.
    fn lookup(&mut self, key: &str) -> Option<&CacheEntry<V>> {
        let expired = match self.entries.get(key) {
            None => {
                self.counters.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            self.entries.remove(key);
            self.order.remove(key);
            self.counters.record_miss();
            self.counters.record_expirations(1);
            trace!(key, "Dropped expired cache entry on read");
            return None;
        }

        self.counters.record_hit();
        if self.policy.promotes_on_read() {
            self.order.touch(key);
        }
        self.entries.get(key)
    }

    // == Get ==
    /// Returns a clone of the live value under `key`.
    ///
    /// Absent and expired keys yield `None`; an expired entry is deleted.
    pub fn get(&mut self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.lookup(key).map(|entry| entry.data.clone())
    }

    // == Peek ==
    /// Returns a clone of the live value under `key` without touching
    /// counters, order or expired entries.
    pub(crate) fn peek(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.data.clone())
    }

    // == Has ==
    /// Same as `get(key).is_some()`, without cloning the value.
    pub fn has(&mut self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    // == Delete ==
    /// Removes an entry, returning whether one was present.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Removes every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    // == Stats ==
    /// Returns a snapshot of size, capacity, keys (oldest first) and counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            max_size: self.max_entries,
            keys: self.order.oldest_first().cloned().collect(),
            counters: self.counters,
        }
    }

    // == Purge Expired ==
    /// Removes all expired entries, returning how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.order.remove(key);
        }

        self.counters.record_expirations(expired_keys.len());
        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }
}
