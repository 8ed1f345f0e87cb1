use crate::error::{ChainError, ChainResult};
use crate::ident::{ColumnRef, RenderContext, resolve_table};
use std::fmt;
use std::str::FromStr;

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
        }
    }
}

impl FromStr for JoinKind {
    type Err = ChainError;

    /// Accepts `"left outer"`, `"LEFT OUTER JOIN"`, `"left_outer"` and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.replace('_', " ").to_uppercase();
        let mut words: Vec<&str> = upper.split_whitespace().collect();
        if words.last() == Some(&"JOIN") {
            words.pop();
        }
        Ok(match words.as_slice() {
            ["INNER"] => JoinKind::Inner,
            ["LEFT"] => JoinKind::Left,
            ["RIGHT"] => JoinKind::Right,
            ["LEFT", "OUTER"] => JoinKind::LeftOuter,
            ["RIGHT", "OUTER"] => JoinKind::RightOuter,
            ["FULL", "OUTER"] => JoinKind::FullOuter,
            _ => {
                return Err(ChainError::invalid_argument(format!(
                    "Unknown join type '{s}'"
                )));
            }
        })
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// `<KIND> JOIN <table> ON a = b [AND c = d ...]`
///
/// In each comparison a bare left column belongs to the statement's base table
/// and a bare right column to the joined table.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    kind: JoinKind,
    table: String,
    on: Vec<(ColumnRef, ColumnRef)>,
}

impl JoinClause {
    pub fn new<I, L, R>(kind: JoinKind, table: &str, prefix: &str, on: I) -> ChainResult<Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        let table = resolve_table(table, prefix)?;
        let on = on
            .into_iter()
            .map(|(l, r)| -> ChainResult<_> {
                Ok((ColumnRef::parse(l.as_ref())?, ColumnRef::parse(r.as_ref())?))
            })
            .collect::<ChainResult<Vec<_>>>()?;
        if on.is_empty() {
            return Err(ChainError::invalid_argument(format!(
                "JOIN {table} requires at least one ON comparison"
            )));
        }
        if on
            .iter()
            .any(|(l, r)| *l == ColumnRef::Star || *r == ColumnRef::Star)
        {
            return Err(ChainError::invalid_argument("JOIN cannot compare '*'"));
        }
        Ok(Self { kind, table, on })
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    /// The resolved (prefixed) joined table.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        let on = self
            .on
            .iter()
            .map(|(left, right)| {
                format!(
                    "{} = {}",
                    left.render_with(ctx.prefix, Some(ctx.base_table)),
                    right.render_with(ctx.prefix, Some(&self.table)),
                )
            })
            .collect::<Vec<_>>()
            .join(" AND ");
        format!("{} {} ON {}", self.kind.as_sql(), self.table, on)
    }
}
