use super::Assignments;
use crate::binding::{Bindings, KeyGen};
use crate::error::ChainResult;
use crate::value::Literal;

/// `SET a = :a_1, b = :b_1`
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    inner: Assignments,
}

impl SetClause {
    pub fn new<I, K, V>(pairs: I, keys: &mut KeyGen) -> ChainResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Literal>,
    {
        Ok(Self {
            inner: Assignments::new(pairs, keys, "SET")?,
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.inner.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn bindings(&self) -> &Bindings {
        &self.inner.bindings
    }

    pub fn render(&self) -> String {
        let assignments = self
            .inner
            .entries
            .iter()
            .map(|(column, key)| format!("{column} = :{key}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("SET {assignments}")
    }
}
