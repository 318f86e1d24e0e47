//! Resilient Cache demo
//!
//! Runs one resilient fetch against a simulated flaky backend, printing the
//! resulting state and cache statistics.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resilient_cache::{
    cleanup_interval, cleanup_subscription, spawn_sweep_task, Config, FetchContext, FetchOptions,
    FetchState, ResilientFetch, SharedCache, TracingReporter,
};

/// Failures the simulated backend returns before it recovers.
const SIMULATED_OUTAGES: u32 = 2;

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the shared cache and start the TTL sweep task
/// 4. Start a resilient fetch against the flaky backend
/// 5. Wait for it to settle, or for SIGINT/SIGTERM
/// 6. Print state and stats, then release every handle
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resilient_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}s, eviction={}, retry_attempts={}, retry_delay={}ms",
        config.max_entries,
        config.default_ttl.as_secs(),
        config.eviction,
        config.retry_attempts,
        config.retry_delay.as_millis()
    );

    let cache: SharedCache<String> = SharedCache::from_config(&config);
    let mut sweeper = Some(spawn_sweep_task(cache.clone(), config.sweep_interval));

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let fetch = ResilientFetch::spawn(
        FetchContext::new(cache.clone(), Arc::new(TracingReporter)),
        FetchOptions::from_config(&config).with_cache_key("demo:greeting"),
        move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt <= SIMULATED_OUTAGES {
                    bail!("backend unavailable (attempt {})", attempt);
                }
                Ok(format!("hello after {} attempts", attempt))
            }
        },
    );

    let mut listener = Some(fetch.on_change(|state| {
        info!(loading = state.loading, error = ?state.error, "Fetch state changed");
    }));

    match settle_or_shutdown(&fetch, shutdown_signal()).await {
        Some(state) => {
            println!("{}", serde_json::to_string_pretty(&state)?);

            // A second fetch for the same key is served from the cache
            fetch.refetch().await;
            info!(producer_calls = calls.load(Ordering::SeqCst), "Refetch served");
        }
        None => warn!("Shutdown requested before the fetch settled"),
    }

    println!("{}", serde_json::to_string_pretty(&cache.stats().await)?);

    fetch.dispose();
    cleanup_subscription(&mut listener);
    cleanup_interval(&mut sweeper);
    info!("Shutdown complete");
    Ok(())
}

/// Waits for `fetch` to settle. Returns `None` if `shutdown` fires first.
async fn settle_or_shutdown<V, S>(fetch: &ResilientFetch<V>, shutdown: S) -> Option<FetchState<V>>
where
    V: Clone + Send + Sync + 'static,
    S: Future<Output = ()>,
{
    tokio::select! {
        state = fetch.settled() => Some(state),
        _ = shutdown => None,
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn context() -> FetchContext<String> {
        FetchContext::with_cache(SharedCache::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_fetch_is_returned() {
        let fetch = ResilientFetch::spawn(context(), FetchOptions::new(), || async {
            Ok("ready".to_string())
        });

        let state = settle_or_shutdown(&fetch, std::future::pending()).await;

        assert_eq!(state.and_then(|s| s.data).as_deref(), Some("ready"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_wins_over_slow_fetch() {
        let fetch = ResilientFetch::spawn(context(), FetchOptions::new(), || async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("late".to_string())
        });

        let state = settle_or_shutdown(&fetch, async {}).await;

        assert!(state.is_none());
        assert!(fetch.loading());
    }
}
