//! Resource Cleanup Helpers
//!
//! Each helper takes the caller's `Option` slot, tears the handle down and
//! leaves `None` behind, so a released handle cannot be reached again.
//! Teardown errors and panics are logged and swallowed.
//!
//! ```ignore
//! let mut sweeper = Some(spawn_sweep_task(cache.clone(), interval));
//! // Later, during shutdown:
//! cleanup_interval(&mut sweeper);
//! cleanup_interval(&mut sweeper); // no-op
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::lifecycle::{Clearable, Subscription};

// == Teardown ==
/// What a cleanup call did. Informational only; cleanup never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Teardown {
    /// The handle was torn down
    Released,
    /// The slot was already empty
    Empty,
    /// Teardown failed; the handle was dropped anyway
    Recovered(String),
}

impl Teardown {
    pub fn is_empty(&self) -> bool {
        matches!(self, Teardown::Empty)
    }
}

pub fn cleanup_subscription<S: Subscription>(handle: &mut Option<S>) -> Teardown {
    release("subscription", handle, |s| s.unsubscribe())
}

pub fn cleanup_interval<T: Clearable>(handle: &mut Option<T>) -> Teardown {
    release("interval", handle, |t| t.clear())
}

pub fn cleanup_timeout<T: Clearable>(handle: &mut Option<T>) -> Teardown {
    release("timeout", handle, |t| t.clear())
}

fn release<H>(
    kind: &'static str,
    handle: &mut Option<H>,
    teardown: impl FnOnce(&mut H) -> anyhow::Result<()>,
) -> Teardown {
    let Some(mut inner) = handle.take() else {
        return Teardown::Empty;
    };

    match panic::catch_unwind(AssertUnwindSafe(|| teardown(&mut inner))) {
        Ok(Ok(())) => {
            debug!(kind, "Released handle");
            Teardown::Released
        }
        Ok(Err(err)) => {
            warn!(kind, error = %err, "Cleanup failed");
            Teardown::Recovered(err.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(kind, error = %message, "Cleanup panicked");
            Teardown::Recovered(message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "teardown panicked".to_string()
    }
}
