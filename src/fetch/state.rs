//! Fetch State

use serde::Serialize;

/// Observable outcome of a resilient fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchState<V> {
    pub data: Option<V>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<V> Default for FetchState<V> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<V> FetchState<V> {
    /// Marks an execution as started. Previous data stays visible.
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn succeed(&mut self, data: V) {
        self.data = Some(data);
        self.loading = false;
        self.error = None;
    }

    pub fn fail(&mut self, message: String) {
        self.data = None;
        self.loading = false;
        self.error = Some(message);
    }

    pub fn is_settled(&self) -> bool {
        !self.loading
    }
}
