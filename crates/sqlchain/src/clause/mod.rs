//! Clause renderers.
//!
//! Each clause is an immutable value built from caller input. Construction
//! validates the input and fails with [`ChainError::InvalidArgument`]; rendering
//! never fails. Parameterized clauses draw their placeholder names from the
//! statement's [`KeyGen`](crate::KeyGen) and expose the resulting [`Bindings`](crate::Bindings).

mod group_by;
mod group_concat;
mod join;
mod limit;
mod order_by;
mod select;
mod set;
mod table;
mod values;
mod where_clause;

#[cfg(test)]
mod tests;

pub use group_by::GroupByClause;
pub use group_concat::GroupConcatClause;
pub use join::{JoinClause, JoinKind};
pub use limit::LimitClause;
pub use order_by::{OrderByClause, SortDirection};
pub use select::{AggregateFn, SelectClause};
pub use set::SetClause;
pub use table::{Dialect, TableDefinition};
pub use values::ValuesClause;
pub use where_clause::{Connector, Operator, WhereClause};

use crate::binding::{Bindings, KeyGen};
use crate::error::{ChainError, ChainResult};
use crate::ident::{ColumnRef, validate_segment};
use crate::value::Literal;

/// Anything that can be turned into a list of column references.
///
/// A `&str` is split on commas, so `"id, name"` and `["id", "name"]` are equivalent.
pub trait IntoColumns {
    fn into_columns(self) -> ChainResult<Vec<ColumnRef>>;
}

impl IntoColumns for &str {
    fn into_columns(self) -> ChainResult<Vec<ColumnRef>> {
        self.split(',').map(ColumnRef::parse).collect()
    }
}

impl IntoColumns for &String {
    fn into_columns(self) -> ChainResult<Vec<ColumnRef>> {
        self.as_str().into_columns()
    }
}

impl IntoColumns for &[&str] {
    fn into_columns(self) -> ChainResult<Vec<ColumnRef>> {
        self.iter().map(|c| ColumnRef::parse(c)).collect()
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> ChainResult<Vec<ColumnRef>> {
        self.iter().map(|c| ColumnRef::parse(c)).collect()
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> ChainResult<Vec<ColumnRef>> {
        self.as_slice().into_columns()
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> ChainResult<Vec<ColumnRef>> {
        self.iter().map(|c| ColumnRef::parse(c)).collect()
    }
}

impl IntoColumns for Vec<ColumnRef> {
    fn into_columns(self) -> ChainResult<Vec<ColumnRef>> {
        Ok(self)
    }
}

/// Column list that must not be empty.
pub(crate) fn non_empty_columns(
    columns: impl IntoColumns,
    clause: &str,
) -> ChainResult<Vec<ColumnRef>> {
    let columns = columns.into_columns()?;
    if columns.is_empty() {
        return Err(ChainError::invalid_argument(format!(
            "{clause} requires at least one column"
        )));
    }
    Ok(columns)
}

/// Column -> placeholder assignments shared by VALUES and SET.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Assignments {
    pub(crate) entries: Vec<(String, String)>,
    pub(crate) bindings: Bindings,
}

impl Assignments {
    pub(crate) fn new<I, K, V>(pairs: I, keys: &mut KeyGen, clause: &str) -> ChainResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Literal>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut bindings = Bindings::new();
        for (column, value) in pairs {
            let column = column.as_ref().trim();
            validate_segment(column)?;
            if entries.iter().any(|(c, _)| c == column) {
                return Err(ChainError::invalid_argument(format!(
                    "{clause} names column '{column}' twice"
                )));
            }
            let value = match value.into() {
                Literal::Array(items) => Literal::Text(crate::value::serialize_array(&items)?),
                other => other,
            };
            let key = keys.next_key(column);
            bindings.insert(&key, value);
            entries.push((column.to_string(), key));
        }
        if entries.is_empty() {
            return Err(ChainError::invalid_argument(format!(
                "{clause} requires at least one column"
            )));
        }
        Ok(Self { entries, bindings })
    }
}
