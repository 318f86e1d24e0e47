//! Error types for the fetch layer
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use thiserror::Error;

// == Fetch Error Enum ==
/// Failure of a fetch as seen by callers.
///
/// `Clone` so a single failed fetch can be handed to every coalesced waiter.
/// `Display` is always the producer's own message.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// A single producer attempt failed
    #[error("{0}")]
    Producer(Arc<anyhow::Error>),

    /// Every attempt allowed by the retry policy failed
    #[error("{last}")]
    RetryExhausted {
        /// Total producer invocations
        attempts: u32,
        /// Error from the final attempt
        last: Arc<anyhow::Error>,
    },
}

impl FetchError {
    /// Wraps the final error after `attempts` invocations.
    pub fn exhausted(attempts: u32, last: anyhow::Error) -> Self {
        FetchError::RetryExhausted {
            attempts,
            last: Arc::new(last),
        }
    }

    /// Human-readable message surfaced in fetch state.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Producer invocations behind this error.
    pub fn attempts(&self) -> u32 {
        match self {
            FetchError::Producer(_) => 1,
            FetchError::RetryExhausted { attempts, .. } => *attempts,
        }
    }

    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, FetchError::RetryExhausted { .. })
    }

    /// The underlying producer error.
    pub fn inner(&self) -> &anyhow::Error {
        match self {
            FetchError::Producer(err) => &**err,
            FetchError::RetryExhausted { last, .. } => &**last,
        }
    }
}

impl From<anyhow::Error> for FetchError {
    fn from(err: anyhow::Error) -> Self {
        FetchError::Producer(Arc::new(err))
    }
}

// == Result Type Alias ==
/// Convenience Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_producer_error_keeps_message() {
        let err = FetchError::from(anyhow!("network down"));
        assert_eq!(err.message(), "network down");
        assert_eq!(err.attempts(), 1);
        assert!(!err.is_retry_exhausted());
    }

    #[test]
    fn test_exhausted_error_shows_last_message() {
        let err = FetchError::exhausted(3, anyhow!("network down"));
        assert_eq!(err.to_string(), "network down");
        assert_eq!(err.attempts(), 3);
        assert!(err.is_retry_exhausted());
    }

    #[test]
    fn test_context_is_not_in_message() {
        let err = FetchError::from(anyhow!("socket closed").context("loading profile"));
        assert_eq!(err.message(), "loading profile");
        assert_eq!(err.inner().root_cause().to_string(), "socket closed");
    }

    #[test]
    fn test_clone_shares_inner_error() {
        let err = FetchError::from(anyhow!("boom"));
        let copy = err.clone();
        assert_eq!(copy.message(), err.message());
    }
}
