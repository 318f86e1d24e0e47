//! Error Reporting
//!
//! Telemetry sink for fetches that failed after every retry. Reporters are
//! injected into each orchestrator so tests can capture what was reported.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::FetchError;

/// Source tag attached to reports from the fetch orchestrator.
pub const ORCHESTRATOR_SOURCE: &str = "fetch-orchestrator";

// == Report Context ==
/// Where a reported failure came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportContext {
    pub source: String,
    pub cache_key: Option<String>,
    pub reported_at: DateTime<Utc>,
}

impl ReportContext {
    pub fn new(source: impl Into<String>, cache_key: Option<String>) -> Self {
        Self {
            source: source.into(),
            cache_key,
            reported_at: Utc::now(),
        }
    }
}

// == Error Reporter ==
/// Receives terminal fetch failures. Fire-and-forget.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &FetchError, context: &ReportContext);
}

/// Forwards `error` to `reporter`, containing any panic raised by it.
pub(crate) fn report_safely(reporter: &dyn ErrorReporter, error: &FetchError, context: &ReportContext) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| reporter.report(error, context)));
    if outcome.is_err() {
        warn!(source = %context.source, "Error reporter panicked; report dropped");
    }
}

// == Tracing Reporter ==
/// Logs reports at `error` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, err: &FetchError, context: &ReportContext) {
        error!(
            source = %context.source,
            cache_key = context.cache_key.as_deref().unwrap_or("-"),
            attempts = err.attempts(),
            error = %err,
            "Fetch failed"
        );
    }
}

// == Memory Reporter ==
/// A report captured by `MemoryReporter`.
#[derive(Debug, Clone)]
pub struct CapturedReport {
    pub error: FetchError,
    pub context: ReportContext,
}

/// Keeps every report in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    reports: Arc<Mutex<Vec<CapturedReport>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<CapturedReport> {
        match self.reports.lock() {
            Ok(reports) => reports.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.reports().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorReporter for MemoryReporter {
    fn report(&self, error: &FetchError, context: &ReportContext) {
        let captured = CapturedReport {
            error: error.clone(),
            context: context.clone(),
        };
        match self.reports.lock() {
            Ok(mut reports) => reports.push(captured),
            Err(poisoned) => poisoned.into_inner().push(captured),
        }
    }
}
