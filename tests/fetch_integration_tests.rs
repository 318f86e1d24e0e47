//! Integration tests for the fetch layer
//!
//! Drive the public API end to end on a paused Tokio clock.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use serde_json::json;
use tokio::time::Instant;

use resilient_cache::lifecycle::Teardown;
use resilient_cache::{
    cached_fetch, cleanup_subscription, CacheStore, FetchContext, FetchOptions, MemoryReporter,
    ResilientFetch, SharedCache,
};

fn cache() -> SharedCache<String> {
    SharedCache::new(CacheStore::new(100, Duration::from_secs(300)))
}

fn context(cache: &SharedCache<String>, reporter: &MemoryReporter) -> FetchContext<String> {
    FetchContext::new(cache.clone(), Arc::new(reporter.clone()))
}

fn assert_close(actual: Duration, expected: Duration) {
    let tolerance = Duration::from_millis(50);
    assert!(
        actual >= expected && actual <= expected + tolerance,
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}

// == Retry and backoff ==

#[tokio::test(start_paused = true)]
async fn test_recovers_on_fourth_attempt_with_exponential_backoff() {
    let reporter = MemoryReporter::new();
    let calls = Arc::new(Mutex::new(Vec::<Instant>::new()));
    let log = calls.clone();

    let fetch = ResilientFetch::spawn(
        context(&cache(), &reporter),
        FetchOptions::new()
            .with_retry_attempts(3)
            .with_retry_delay(Duration::from_millis(1000)),
        move || {
            let attempt = {
                let mut log = log.lock().unwrap();
                log.push(Instant::now());
                log.len()
            };
            async move {
                if attempt <= 3 {
                    Err(anyhow!("attempt {} failed", attempt))
                } else {
                    Ok("payload".to_string())
                }
            }
        },
    );

    let state = fetch.settled().await;

    assert_eq!(state.data.as_deref(), Some("payload"));
    assert!(state.error.is_none());
    assert!(!state.loading);
    assert!(reporter.is_empty());

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 4);
    assert_close(calls[1] - calls[0], Duration::from_millis(1000));
    assert_close(calls[2] - calls[1], Duration::from_millis(2000));
    assert_close(calls[3] - calls[2], Duration::from_millis(4000));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_set_error_and_report_once() {
    let cache = cache();
    let reporter = MemoryReporter::new();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let fetch = ResilientFetch::spawn(
        context(&cache, &reporter),
        FetchOptions::new()
            .with_cache_key("users")
            .with_retry_attempts(2)
            .with_retry_delay(Duration::from_millis(10)),
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<String, _>(anyhow!("network down")) }
        },
    );

    let state = fetch.settled().await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(state.error.as_deref(), Some("network down"));
    assert!(state.data.is_none());
    assert!(!state.loading);

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].context.source, "fetch-orchestrator");
    assert_eq!(reports[0].context.cache_key.as_deref(), Some("users"));
    assert_eq!(reports[0].error.attempts(), 3);
    assert!(reports[0].error.is_retry_exhausted());

    // Failures are never cached
    assert!(!cache.has("users").await);
}

#[tokio::test(start_paused = true)]
async fn test_report_without_cache_key() {
    let reporter = MemoryReporter::new();

    let fetch = ResilientFetch::spawn(
        context(&cache(), &reporter),
        FetchOptions::new().with_retry_attempts(0),
        || async { Err::<String, _>(anyhow!("boom")) },
    );

    let state = fetch.settled().await;

    assert_eq!(state.error.as_deref(), Some("boom"));
    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].context.cache_key.is_none());
}

// == Disposal and stale results ==

#[tokio::test(start_paused = true)]
async fn test_result_after_dispose_is_dropped() {
    let reporter = MemoryReporter::new();
    let completed = Arc::new(AtomicU32::new(0));
    let done = completed.clone();

    let fetch = ResilientFetch::spawn(
        context(&cache(), &reporter),
        FetchOptions::new(),
        move || {
            let done = done.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok("late".to_string())
            }
        },
    );
    assert!(fetch.loading());

    fetch.dispose();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(completed.load(Ordering::SeqCst), 1);
    assert!(fetch.is_disposed());
    assert!(fetch.data().is_none());
    assert!(fetch.loading());

    // Refetch is a no-op once disposed
    fetch.refetch().await;
    assert_eq!(completed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_run_does_not_overwrite_newer_result() {
    let reporter = MemoryReporter::new();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    // First run is slow, second is fast
    let fetch = ResilientFetch::spawn(
        context(&cache(), &reporter),
        FetchOptions::new().with_dependencies(vec![json!(0)]),
        move || {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                let delay = if call == 1 { 5 } else { 1 };
                tokio::time::sleep(Duration::from_secs(delay)).await;
                Ok(format!("run {}", call))
            }
        },
    );
    while calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    let rerun = fetch
        .set_dependencies(vec![json!(1)])
        .expect("changed dependencies trigger a run");
    rerun.await.unwrap();
    assert_eq!(fetch.data().as_deref(), Some("run 2"));
    assert!(!fetch.loading());

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(fetch.data().as_deref(), Some("run 2"));
}

#[tokio::test(start_paused = true)]
async fn test_equal_dependencies_do_not_rerun() {
    let reporter = MemoryReporter::new();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let fetch = ResilientFetch::spawn(
        context(&cache(), &reporter),
        FetchOptions::new().with_dependencies(vec![json!("team-a"), json!(7)]),
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok("ok".to_string()) }
        },
    );
    fetch.settled().await;

    assert!(fetch.set_dependencies(vec![json!("team-a"), json!(7)]).is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// == Cache path ==

#[tokio::test(start_paused = true)]
async fn test_cached_result_is_shared_across_orchestrators() {
    let cache = cache();
    let reporter = MemoryReporter::new();

    let first = ResilientFetch::spawn(
        context(&cache, &reporter),
        FetchOptions::new().with_cache_key("profile:1"),
        || async { Ok("alice".to_string()) },
    );
    first.settled().await;
    assert_eq!(cache.get("profile:1").await.as_deref(), Some("alice"));

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let second = ResilientFetch::spawn(
        context(&cache, &reporter),
        FetchOptions::new().with_cache_key("profile:1"),
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok("bob".to_string()) }
        },
    );
    let state = second.settled().await;

    assert_eq!(state.data.as_deref(), Some("alice"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_cached_fetches_share_one_call() {
    let cache = cache();
    let calls = Arc::new(AtomicU32::new(0));

    let producer = || {
        let counter = calls.clone();
        move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok("shared".to_string())
        }
    };

    let (a, b, c) = tokio::join!(
        cached_fetch(&cache, "hot", producer(), None),
        cached_fetch(&cache, "hot", producer(), None),
        cached_fetch(&cache, "hot", producer(), None),
    );

    assert_eq!(a.unwrap(), "shared");
    assert_eq!(b.unwrap(), "shared");
    assert_eq!(c.unwrap(), "shared");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.pending_fetches().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cached_entry_expires_after_ttl() {
    let cache = cache();
    let calls = Arc::new(AtomicU32::new(0));

    for _ in 0..2 {
        let counter = calls.clone();
        let value = cached_fetch(
            &cache,
            "short",
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("v".to_string())
            },
            Some(Duration::from_secs(1)),
        )
        .await;
        assert_eq!(value.unwrap(), "v");
        tokio::time::advance(Duration::from_millis(1500)).await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// == Teardown ==

#[tokio::test(start_paused = true)]
async fn test_listener_cleanup_is_idempotent() {
    let reporter = MemoryReporter::new();
    let seen = Arc::new(AtomicU32::new(0));
    let count = seen.clone();

    let fetch = ResilientFetch::spawn(
        context(&cache(), &reporter),
        FetchOptions::new(),
        || async { Ok("x".to_string()) },
    );
    let mut listener = Some(fetch.on_change(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    }));
    fetch.settled().await;
    tokio::task::yield_now().await;

    assert_eq!(cleanup_subscription(&mut listener), Teardown::Released);
    assert!(listener.is_none());
    assert_eq!(cleanup_subscription(&mut listener), Teardown::Empty);

    let before = seen.load(Ordering::SeqCst);
    fetch.refetch().await;
    tokio::task::yield_now().await;
    assert_eq!(seen.load(Ordering::SeqCst), before);
}
