//! Result rows and row mapping.

use crate::error::{ChainError, ChainResult};
use crate::value::Literal;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One result row: column names in select order, each with a [`Literal`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Literal>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. A repeated name shadows nothing; [`Row::get`] returns the first.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Literal>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Literal] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Literal> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Typed access, returning [`ChainError::Decode`] on a missing column or type mismatch.
    pub fn get_as<T>(&self, column: &str) -> ChainResult<T>
    where
        T: TryFrom<Literal>,
        T::Error: std::fmt::Display,
    {
        let value = self
            .get(column)
            .ok_or_else(|| ChainError::decode(column, "no such column"))?;
        T::try_from(value.clone()).map_err(|e| ChainError::decode(column, e.to_string()))
    }

    /// Like [`Row::get_as`], but `NULL` maps to `None`.
    pub fn get_opt<T>(&self, column: &str) -> ChainResult<Option<T>>
    where
        T: TryFrom<Literal>,
        T::Error: std::fmt::Display,
    {
        match self.get(column) {
            Some(Literal::Null) => Ok(None),
            _ => self.get_as(column).map(Some),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Literal)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl<K: Into<String>, V: Into<Literal>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.push(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Map a [`Row`] into a caller type.
///
/// # Example
/// ```
/// use sqlchain::{ChainResult, FromRow, Row};
///
/// struct User {
///     id: i64,
///     username: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> ChainResult<Self> {
///         Ok(Self {
///             id: row.get_as("id")?,
///             username: row.get_as("username")?,
///         })
///     }
/// }
///
/// let row: Row = [("id", sqlchain::Literal::Int(1)), ("username", "x".into())]
///     .into_iter()
///     .collect();
/// let user = User::from_row(&row)?;
/// assert_eq!(user.id, 1);
/// # Ok::<(), sqlchain::ChainError>(())
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> ChainResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> ChainResult<Self> {
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        [
            ("id", Literal::Int(7)),
            ("name", Literal::text("ann")),
            ("bio", Literal::Null),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn typed_access() {
        let row = sample();
        assert_eq!(row.get_as::<i64>("id").unwrap(), 7);
        assert_eq!(row.get_as::<String>("name").unwrap(), "ann");
        assert_eq!(row.get_opt::<String>("bio").unwrap(), None);
        assert_eq!(row.columns(), ["id", "name", "bio"]);
    }

    #[test]
    fn typed_access_errors_name_the_column() {
        let row = sample();
        let err = row.get_as::<i64>("name").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Decode error on column 'name': expected int, found text"
        );
        assert!(matches!(
            row.get_as::<i64>("missing"),
            Err(ChainError::Decode { .. })
        ));
    }

    #[test]
    fn serializes_as_ordered_map() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"id":7,"name":"ann","bio":null}"#);
    }
}
