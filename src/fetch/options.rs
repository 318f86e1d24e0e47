//! Fetch Options

use std::time::Duration;

use serde_json::Value;

use crate::cache::DEFAULT_TTL;
use crate::config::Config;
use crate::fetch::retry::{RetryPolicy, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};

/// Per-orchestrator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Resolve through the cache under this key when set.
    pub cache_key: Option<String>,
    /// TTL for values this orchestrator writes to the cache.
    pub cache_ttl: Duration,
    /// Retries after the first failed attempt.
    pub retry_attempts: u32,
    /// Backoff base delay.
    pub retry_delay: Duration,
    /// Values whose change re-runs the fetch, compared by value.
    pub dependencies: Vec<Value>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cache_key: None,
            cache_ttl: DEFAULT_TTL,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            dependencies: Vec::new(),
        }
    }
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults taken from `Config` instead of the built-in constants.
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache_ttl: config.default_ttl,
            retry_attempts: config.retry_attempts,
            retry_delay: config.retry_delay,
            ..Self::default()
        }
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Value>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_delay)
    }
}
