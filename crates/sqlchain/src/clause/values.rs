use super::Assignments;
use crate::binding::{Bindings, KeyGen};
use crate::error::ChainResult;
use crate::value::Literal;

/// `(a, b) VALUES (:a_1, :b_1)`
///
/// Columns keep the order they were supplied in. Array values are serialized to
/// JSON text before binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesClause {
    inner: Assignments,
}

impl ValuesClause {
    pub fn new<I, K, V>(pairs: I, keys: &mut KeyGen) -> ChainResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Literal>,
    {
        Ok(Self {
            inner: Assignments::new(pairs, keys, "VALUES")?,
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.inner.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn bindings(&self) -> &Bindings {
        &self.inner.bindings
    }

    pub fn render(&self) -> String {
        let (columns, placeholders): (Vec<&str>, Vec<String>) = self
            .inner
            .entries
            .iter()
            .map(|(column, key)| (column.as_str(), format!(":{key}")))
            .unzip();
        format!(
            "({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        )
    }
}
