//! Configuration Module
//!
//! Handles loading cache and fetch settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::EvictionPolicy;

/// Cache and fetch configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// TTL for entries stored without an explicit one
    pub default_ttl: Duration,
    /// Which entry is evicted when the cache is full
    pub eviction: EvictionPolicy,
    /// Interval between background sweeps of expired entries
    pub sweep_interval: Duration,
    /// Additional attempts after the first failed fetch
    pub retry_attempts: u32,
    /// Base delay of the exponential backoff
    pub retry_delay: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 100)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_EVICTION` - `fifo` or `lru` (default: fifo)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `FETCH_RETRY_ATTEMPTS` - Retries after the first failure (default: 3)
    /// - `FETCH_RETRY_DELAY_MS` - Backoff base delay in milliseconds (default: 1000)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: parse_var("CACHE_MAX_ENTRIES").unwrap_or(defaults.max_entries),
            default_ttl: parse_var("CACHE_DEFAULT_TTL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_ttl),
            eviction: parse_var("CACHE_EVICTION").unwrap_or(defaults.eviction),
            sweep_interval: parse_var("CACHE_SWEEP_INTERVAL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            retry_attempts: parse_var("FETCH_RETRY_ATTEMPTS").unwrap_or(defaults.retry_attempts),
            retry_delay: parse_var("FETCH_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 100,
            default_ttl: Duration::from_secs(300),
            eviction: EvictionPolicy::Fifo,
            sweep_interval: Duration::from_secs(60),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}
