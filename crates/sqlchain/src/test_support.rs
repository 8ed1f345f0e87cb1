//! In-memory executor for unit tests.

use crate::binding::Bindings;
use crate::error::{ChainError, ChainResult};
use crate::executor::Executor;
use crate::handler::{ConnectionConfig, ConnectionHandler};
use crate::row::Row;
use std::sync::{Arc, Mutex};

/// Records every call and answers with canned rows / counts.
#[derive(Debug, Default)]
pub(crate) struct RecordingExecutor {
    calls: Mutex<Vec<(String, Bindings)>>,
    rows: Mutex<Vec<Row>>,
    affected: Mutex<u64>,
    failure: Mutex<Option<String>>,
}

impl RecordingExecutor {
    pub(crate) fn calls(&self) -> Vec<(String, Bindings)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn last_sql(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|(sql, _)| sql.clone())
    }

    pub(crate) fn set_rows(&self, rows: Vec<Row>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub(crate) fn set_affected(&self, n: u64) {
        *self.affected.lock().unwrap() = n;
    }

    /// Make every following call fail with `message`.
    pub(crate) fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    fn record(&self, sql: &str, bindings: &Bindings) -> ChainResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), bindings.clone()));
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(ChainError::execution(message.clone())),
            None => Ok(()),
        }
    }
}

impl Executor for RecordingExecutor {
    fn fetch(&self, sql: &str, bindings: &Bindings) -> ChainResult<Vec<Row>> {
        self.record(sql, bindings)?;
        Ok(self.rows.lock().unwrap().clone())
    }

    fn execute(&self, sql: &str, bindings: &Bindings) -> ChainResult<u64> {
        self.record(sql, bindings)?;
        Ok(*self.affected.lock().unwrap())
    }
}

pub(crate) fn handler(config: ConnectionConfig) -> Arc<ConnectionHandler<RecordingExecutor>> {
    Arc::new(ConnectionHandler::new(RecordingExecutor::default(), config))
}

pub(crate) fn prefixed(prefix: &str) -> Arc<ConnectionHandler<RecordingExecutor>> {
    handler(ConnectionConfig::new().table_prefix(prefix))
}

pub(crate) fn row(pairs: &[(&str, i64)]) -> Row {
    pairs.iter().map(|(c, v)| (*c, *v)).collect()
}
