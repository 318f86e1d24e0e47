//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tracing::{debug, info};

use crate::cache::SharedCache;
use crate::lifecycle::{spawn_interval, IntervalHandle};

/// Spawns a background task that purges expired entries every `interval`.
///
/// Reads and writes already expire entries lazily; the sweep keeps memory
/// bounded for keys that are never touched again.
///
/// # Returns
/// An `IntervalHandle`, released with `cleanup_interval` during shutdown.
///
/// # Example
/// ```ignore
/// let mut sweeper = Some(spawn_sweep_task(cache.clone(), Duration::from_secs(60)));
/// // Later, during shutdown:
/// cleanup_interval(&mut sweeper);
/// ```
pub fn spawn_sweep_task<V>(cache: SharedCache<V>, interval: Duration) -> IntervalHandle
where
    V: Send + Sync + 'static,
{
    info!(
        "Starting TTL sweep task with interval of {} seconds",
        interval.as_secs_f64()
    );

    spawn_interval(interval, move || {
        let cache = cache.clone();
        async move {
            let removed = cache.purge_expired().await;
            if removed > 0 {
                info!("TTL sweep: removed {} expired entries", removed);
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}
