//! Fetch Module
//!
//! Cache-aside fetching, retry/backoff and the resilient fetch orchestrator.

mod cached;
mod options;
mod orchestrator;
mod retry;
mod state;

pub use cached::cached_fetch;
pub use options::FetchOptions;
pub use orchestrator::{FetchContext, ResilientFetch, StateListener};
pub use retry::{RetryPolicy, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};
pub use state::FetchState;
