//! Resilient Cache - client-side data-access resilience
//!
//! A bounded TTL cache, cache-aside fetching with request coalescing, a
//! retrying fetch orchestrator with disposal-safe state, and idempotent
//! teardown helpers for subscriptions, intervals and timeouts.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod report;
pub mod tasks;

pub use cache::{CacheStore, SharedCache};
pub use config::Config;
pub use error::FetchError;
pub use fetch::{cached_fetch, FetchContext, FetchOptions, FetchState, ResilientFetch};
pub use lifecycle::{cleanup_interval, cleanup_subscription, cleanup_timeout};
pub use report::{ErrorReporter, MemoryReporter, TracingReporter};
pub use tasks::spawn_sweep_task;
