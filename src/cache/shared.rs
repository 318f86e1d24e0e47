//! Shared Cache Handle
//!
//! Cloneable async handle around a `CacheStore`, plus the per-key table of
//! in-flight fetches used to coalesce concurrent misses.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::Result;

type PendingFetch<V> = Shared<BoxFuture<'static, Result<V>>>;

// == Shared Cache ==
/// Handle to one cache domain. Clones refer to the same store.
///
/// Each operation takes the store's write lock for its own duration only, so
/// two separate calls (a `has` followed by a `get`) are not transactional.
pub struct SharedCache<V> {
    store: Arc<RwLock<CacheStore<V>>>,
    /// Weak so a fetch every waiter abandoned is dropped, freeing its key.
    in_flight: Arc<Mutex<HashMap<String, WeakShared<BoxFuture<'static, Result<V>>>>>>,
}

impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<V> Default for SharedCache<V> {
    fn default() -> Self {
        Self::new(CacheStore::default())
    }
}

impl<V> SharedCache<V> {
    /// Wraps an existing store.
    pub fn new(store: CacheStore<V>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a handle around a store built from `Config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheStore::from_config(config))
    }

    pub async fn set(&self, key: impl Into<String>, data: V, ttl: Option<Duration>) {
        self.store.write().await.set(key, data, ttl);
    }

    pub async fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        // Write lock: reads may drop expired entries
        self.store.write().await.get(key)
    }

    pub async fn has(&self, key: &str) -> bool {
        self.store.write().await.has(key)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn purge_expired(&self) -> usize {
        self.store.write().await.purge_expired()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

impl<V> SharedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Number of keys with a fetch currently in flight.
    pub async fn pending_fetches(&self) -> usize {
        self.in_flight
            .lock()
            .await
            .values()
            .filter(|pending| pending.upgrade().is_some())
            .count()
    }

    // == Get Or Fetch ==
    /// Cache-aside read with request coalescing.
    ///
    /// A hit returns the stored value without calling `producer`. On a miss the
    /// first caller starts the producer and registers its future under `key`;
    /// concurrent callers for the same key await that same future. A success is
    /// stored with `ttl`, a failure is returned to every waiter and nothing is
    /// stored. The in-flight slot is released once the fetch settles, or once
    /// every waiter has been dropped, which also cancels the producer.
    pub(crate) async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        producer: F,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        if let Some(hit) = self.get(key).await {
            debug!(key, "Cache hit");
            return Ok(hit);
        }

        let pending = {
            // Lock order: in_flight, then store. `settle` never holds both.
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(key).and_then(WeakShared::upgrade) {
                Some(existing) => {
                    debug!(key, "Joining in-flight fetch");
                    existing
                }
                None => {
                    // A fetch may have settled while we waited for the lock.
                    // The miss above is already counted.
                    if let Some(hit) = self.store.read().await.peek(key) {
                        return Ok(hit);
                    }
                    debug!(key, "Cache miss, starting fetch");
                    in_flight.retain(|_, pending| pending.upgrade().is_some());
                    let fetch: PendingFetch<V> = self
                        .clone()
                        .settle(key.to_string(), ttl, producer())
                        .boxed()
                        .shared();
                    if let Some(weak) = fetch.downgrade() {
                        in_flight.insert(key.to_string(), weak);
                    }
                    fetch
                }
            }
        };

        pending.await
    }

    async fn settle<Fut>(self, key: String, ttl: Option<Duration>, fetch: Fut) -> Result<V>
    where
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let result = fetch.await;
        if let Ok(value) = &result {
            self.store.write().await.set(key.clone(), value.clone(), ttl);
        }
        self.in_flight.lock().await.remove(&key);
        result
    }
}
