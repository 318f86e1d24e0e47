//! Cache-Aside Fetch

use std::future::Future;
use std::time::Duration;

use futures::TryFutureExt;

use crate::cache::SharedCache;
use crate::error::{FetchError, Result};

/// Resolves `key` through `cache`, calling `producer` only on a miss.
///
/// On a hit the producer is never invoked. On a miss it is invoked once, its
/// value stored under `key` with `ttl` (the store default when `None`) and
/// returned. A producer error is returned as `FetchError::Producer` with the
/// producer's message and nothing is cached. Concurrent misses on the same key
/// share one producer invocation.
pub async fn cached_fetch<V, F, Fut>(
    cache: &SharedCache<V>,
    key: &str,
    producer: F,
    ttl: Option<Duration>,
) -> Result<V>
where
    V: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
{
    cache
        .get_or_fetch(key, ttl, move || producer().map_err(FetchError::from))
        .await
}
