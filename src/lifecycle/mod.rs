//! Lifecycle Module
//!
//! Disposable handles and the idempotent helpers that tear them down.

mod cleanup;
mod handles;

pub use cleanup::{cleanup_interval, cleanup_subscription, cleanup_timeout, Teardown};
pub use handles::{
    spawn_interval, spawn_timeout, Clearable, IntervalHandle, Subscription, TimeoutHandle,
};
