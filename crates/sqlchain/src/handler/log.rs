use crate::binding::Bindings;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One executed (or cache-served) statement.
///
/// Serializes as `{query, time, from_cache}`, plus `error` when the executor failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// SQL with every bound placeholder replaced by its literal. For reading only.
    pub query: String,
    /// Bindings the statement ran with, after sanitization.
    #[serde(skip)]
    pub bindings: Bindings,
    /// Elapsed wall-clock seconds.
    pub time: f64,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Append-only statement log.
#[derive(Debug, Default)]
pub struct QueryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, entry: LogEntry) {
        self.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<LogEntry> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
