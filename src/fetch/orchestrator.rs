//! Resilient Fetch Orchestrator
//!
//! Wraps one async producer with retry/backoff, optional cache-aside
//! resolution, dependency-triggered re-execution and disposal-safe state.
//!
//! # State updates
//! Every execution takes a new generation number when it starts. Its result is
//! applied only if no newer execution has started since and the owner has not
//! disposed the orchestrator; otherwise it is dropped silently.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::cache::SharedCache;
use crate::fetch::{FetchOptions, FetchState, RetryPolicy};
use crate::lifecycle::Subscription;
use crate::report::{report_safely, ErrorReporter, ReportContext, TracingReporter, ORCHESTRATOR_SOURCE};

type Producer<V> = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<V>> + Send + Sync>;

// == Fetch Context ==
/// Collaborators injected into every orchestrator.
pub struct FetchContext<V> {
    pub cache: SharedCache<V>,
    pub reporter: Arc<dyn ErrorReporter>,
}

impl<V> Clone for FetchContext<V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            reporter: Arc::clone(&self.reporter),
        }
    }
}

impl<V> FetchContext<V> {
    pub fn new(cache: SharedCache<V>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { cache, reporter }
    }

    /// Context that logs terminal failures through `tracing`.
    pub fn with_cache(cache: SharedCache<V>) -> Self {
        Self::new(cache, Arc::new(TracingReporter))
    }
}

struct Inner<V> {
    producer: Producer<V>,
    cache_key: Option<String>,
    cache_ttl: Duration,
    policy: RetryPolicy,
    context: FetchContext<V>,
    dependencies: watch::Sender<Vec<Value>>,
    state: watch::Sender<FetchState<V>>,
    alive: AtomicBool,
    generation: AtomicU64,
    disposed: Notify,
}

impl<V> Inner<V> {
    /// Applies `update` if the owner is alive and `generation` is the latest.
    ///
    /// The checks run under the state channel's lock, which `dispose` also
    /// takes, so no update can land after disposal returns.
    fn apply(&self, generation: u64, update: impl FnOnce(&mut FetchState<V>)) -> bool {
        self.state.send_if_modified(|state| {
            if !self.alive.load(Ordering::Acquire) {
                trace!(generation, "Suppressed state update after disposal");
                return false;
            }
            if self.generation.load(Ordering::Acquire) != generation {
                debug!(generation, "Discarded stale fetch result");
                return false;
            }
            update(state);
            true
        })
    }

    fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.apply(generation, FetchState::begin);
        generation
    }

    fn dispose(&self) {
        self.state.send_if_modified(|_| {
            self.alive.store(false, Ordering::Release);
            false
        });
        self.disposed.notify_waiters();
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl<V> Inner<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn execute(&self, generation: u64) {
        debug!(generation, cache_key = ?self.cache_key, "Running fetch");
        let outcome = match &self.cache_key {
            Some(key) => {
                let producer = Arc::clone(&self.producer);
                let policy = self.policy;
                self.context
                    .cache
                    .get_or_fetch(key, Some(self.cache_ttl), move || async move {
                        policy.run(|| producer()).await
                    })
                    .await
            }
            None => self.policy.run(|| (self.producer)()).await,
        };

        match outcome {
            Ok(data) => {
                self.apply(generation, |state| state.succeed(data));
            }
            Err(err) => {
                let context = ReportContext::new(ORCHESTRATOR_SOURCE, self.cache_key.clone());
                report_safely(self.context.reporter.as_ref(), &err, &context);
                let message = err.message();
                self.apply(generation, |state| state.fail(message));
            }
        }
    }
}

// == Resilient Fetch ==
/// One logical data need: a producer plus the state it feeds.
///
/// Dropping the handle disposes it. Must be created inside a Tokio runtime.
pub struct ResilientFetch<V> {
    inner: Arc<Inner<V>>,
}

impl<V> ResilientFetch<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates the orchestrator and starts the first execution in the background.
    pub fn spawn<F, Fut>(context: FetchContext<V>, options: FetchOptions, producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let producer: Producer<V> = Arc::new(move || producer().boxed());
        let policy = options.retry_policy();
        let (state, _) = watch::channel(FetchState::default());
        let (dependencies, _) = watch::channel(options.dependencies);

        let fetch = Self {
            inner: Arc::new(Inner {
                producer,
                cache_key: options.cache_key,
                cache_ttl: options.cache_ttl,
                policy,
                context,
                dependencies,
                state,
                alive: AtomicBool::new(true),
                generation: AtomicU64::new(0),
                disposed: Notify::new(),
            }),
        };
        fetch.trigger();
        fetch
    }

    fn trigger(&self) -> JoinHandle<()> {
        let generation = self.inner.begin();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.execute(generation).await })
    }

    // == Refetch ==
    /// Runs the pipeline again with a fresh retry budget and waits for it.
    ///
    /// No-op once disposed.
    pub async fn refetch(&self) {
        if !self.inner.is_alive() {
            debug!("Refetch ignored after disposal");
            return;
        }
        let generation = self.inner.begin();
        self.inner.execute(generation).await;
    }

    // == Dependencies ==
    /// Replaces the dependency list, re-running the fetch if it changed.
    ///
    /// Returns the handle of the triggered execution. The previous execution is
    /// not cancelled, but its result will be discarded.
    pub fn set_dependencies(&self, dependencies: Vec<Value>) -> Option<JoinHandle<()>> {
        if !self.inner.is_alive() {
            return None;
        }
        let changed = self.inner.dependencies.send_if_modified(|current| {
            if *current == dependencies {
                false
            } else {
                *current = dependencies;
                true
            }
        });

        if changed {
            debug!(cache_key = ?self.inner.cache_key, "Dependencies changed, re-running fetch");
            Some(self.trigger())
        } else {
            None
        }
    }

    pub fn dependencies(&self) -> Vec<Value> {
        self.inner.dependencies.borrow().clone()
    }

    // == State ==
    pub fn state(&self) -> FetchState<V> {
        self.inner.state.borrow().clone()
    }

    pub fn data(&self) -> Option<V> {
        self.inner.state.borrow().data.clone()
    }

    pub fn loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    /// Receiver notified on every applied state change.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<V>> {
        self.inner.state.subscribe()
    }

    /// Waits until no execution is loading, or until disposal.
    pub async fn settled(&self) -> FetchState<V> {
        let mut receiver = self.subscribe();
        let disposed = self.inner.disposed.notified();
        tokio::pin!(disposed);
        disposed.as_mut().enable();

        if !self.inner.is_alive() {
            return self.state();
        }

        tokio::select! {
            settled = receiver.wait_for(FetchState::is_settled) => {
                settled.map(|state| state.clone()).unwrap_or_else(|_| self.state())
            }
            _ = &mut disposed => self.state(),
        }
    }

    /// Calls `callback` with each new state until unsubscribed.
    pub fn on_change<C>(&self, mut callback: C) -> StateListener
    where
        C: FnMut(&FetchState<V>) + Send + 'static,
    {
        let mut receiver = self.subscribe();
        let task = tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let state = receiver.borrow_and_update().clone();
                callback(&state);
            }
        });
        StateListener { task }
    }
}

impl<V> ResilientFetch<V> {
    /// Signals owner teardown. Later results never reach the state.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        !self.inner.is_alive()
    }
}

impl<V> Drop for ResilientFetch<V> {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

// == State Listener ==
/// Subscription returned by `ResilientFetch::on_change`.
#[derive(Debug)]
pub struct StateListener {
    task: JoinHandle<()>,
}

impl Subscription for StateListener {
    fn unsubscribe(&mut self) -> anyhow::Result<()> {
        self.task.abort();
        Ok(())
    }
}
