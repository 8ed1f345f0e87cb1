//! SQLite executor backed by `rusqlite`.

use crate::binding::Bindings;
use crate::error::ChainResult;
use crate::executor::Executor;
use crate::row::Row;
use crate::value::{Literal, serialize_array};
use rusqlite::types::Value;
use rusqlite::{Connection, Statement, ToSql};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// [`Executor`] over a single SQLite connection.
///
/// Bindings that have no matching `:name` placeholder in the statement are skipped,
/// so one binding set can be reused across statements.
#[derive(Debug)]
pub struct SqliteExecutor {
    conn: Mutex<Connection>,
}

impl SqliteExecutor {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open_in_memory() -> ChainResult<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> ChainResult<Self> {
        Ok(Self::new(Connection::open(path)?))
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run several `;`-separated statements without bindings (schema setup, fixtures).
    pub fn execute_batch(&self, sql: &str) -> ChainResult<()> {
        self.lock().execute_batch(sql)?;
        Ok(())
    }

    /// Borrow the underlying connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        f(&self.lock())
    }
}

/// Bindings the statement actually references, as rusqlite values.
fn statement_params(stmt: &Statement<'_>, bindings: &Bindings) -> ChainResult<Vec<(String, Value)>> {
    let mut params = Vec::with_capacity(bindings.len());
    for (name, literal) in bindings {
        let placeholder = format!(":{name}");
        if stmt.parameter_index(&placeholder)?.is_some() {
            params.push((placeholder, to_value(literal)?));
        }
    }
    Ok(params)
}

fn to_value(literal: &Literal) -> ChainResult<Value> {
    Ok(match literal {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Integer(i64::from(*b)),
        Literal::Int(v) => Value::Integer(*v),
        Literal::Float(v) => Value::Real(*v),
        Literal::Text(s) => Value::Text(s.clone()),
        Literal::Array(items) => Value::Text(serialize_array(items)?),
    })
}

fn from_value(value: Value) -> Literal {
    match value {
        Value::Null => Literal::Null,
        Value::Integer(v) => Literal::Int(v),
        Value::Real(v) => Literal::Float(v),
        Value::Text(s) => Literal::Text(s),
        Value::Blob(bytes) => Literal::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

impl Executor for SqliteExecutor {
    fn fetch(&self, sql: &str, bindings: &Bindings) -> ChainResult<Vec<Row>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql)?;
        let params = statement_params(&stmt, bindings)?;
        let params_ref: Vec<(&str, &dyn ToSql)> = params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect();
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let mut rows = stmt.query(params_ref.as_slice())?;
        let mut out = Vec::new();
        while let Some(sqlite_row) = rows.next()? {
            let mut row = Row::new();
            for (i, column) in columns.iter().enumerate() {
                row.push(column.clone(), from_value(sqlite_row.get::<_, Value>(i)?));
            }
            out.push(row);
        }
        Ok(out)
    }

    fn execute(&self, sql: &str, bindings: &Bindings) -> ChainResult<u64> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql)?;
        let params = statement_params(&stmt, bindings)?;
        let params_ref: Vec<(&str, &dyn ToSql)> = params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect();
        let changed = stmt.execute(params_ref.as_slice())?;
        Ok(changed as u64)
    }
}
