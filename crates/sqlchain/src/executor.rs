//! The statement executor contract.

use crate::binding::Bindings;
use crate::error::ChainResult;
use crate::row::Row;
use std::sync::Arc;

/// Runs finished SQL against a database.
///
/// Implementations bind parameters by name (`:name` in the SQL, `name` in
/// [`Bindings`]) and must support `NULL`, integer, float, text and boolean values.
/// Bindings reaching an executor through [`ConnectionHandler`](crate::ConnectionHandler)
/// are already sanitized. Errors are returned as-is; nothing above this layer retries.
pub trait Executor {
    /// Run a statement that returns rows.
    fn fetch(&self, sql: &str, bindings: &Bindings) -> ChainResult<Vec<Row>>;

    /// Run a statement that does not return rows; returns the affected-row count.
    fn execute(&self, sql: &str, bindings: &Bindings) -> ChainResult<u64>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn fetch(&self, sql: &str, bindings: &Bindings) -> ChainResult<Vec<Row>> {
        (**self).fetch(sql, bindings)
    }

    fn execute(&self, sql: &str, bindings: &Bindings) -> ChainResult<u64> {
        (**self).execute(sql, bindings)
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn fetch(&self, sql: &str, bindings: &Bindings) -> ChainResult<Vec<Row>> {
        (**self).fetch(sql, bindings)
    }

    fn execute(&self, sql: &str, bindings: &Bindings) -> ChainResult<u64> {
        (**self).execute(sql, bindings)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn fetch(&self, sql: &str, bindings: &Bindings) -> ChainResult<Vec<Row>> {
        (**self).fetch(sql, bindings)
    }

    fn execute(&self, sql: &str, bindings: &Bindings) -> ChainResult<u64> {
        (**self).execute(sql, bindings)
    }
}

/// What a statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// SELECT/SHOW rows; `None` when nothing matched.
    Rows(Option<Vec<Row>>),
    /// UPDATE/DELETE affected-row count.
    Affected(u64),
    /// INSERT success flag.
    Inserted(bool),
    /// DDL and other statements.
    Executed,
}

impl Outcome {
    pub(crate) fn from_rows(rows: Vec<Row>) -> Self {
        if rows.is_empty() {
            Outcome::Rows(None)
        } else {
            Outcome::Rows(Some(rows))
        }
    }

    /// Rows, if this is a read result with at least one row.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Outcome::Rows(Some(rows)) => Some(rows),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            Outcome::Rows(rows) => rows,
            _ => None,
        }
    }

    pub fn affected(&self) -> Option<u64> {
        match self {
            Outcome::Affected(n) => Some(*n),
            _ => None,
        }
    }

    pub fn inserted(&self) -> Option<bool> {
        match self {
            Outcome::Inserted(ok) => Some(*ok),
            _ => None,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, Outcome::Executed)
    }
}
