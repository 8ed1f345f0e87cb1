use super::{IntoColumns, non_empty_columns};
use crate::error::{ChainError, ChainResult};
use crate::ident::{ColumnRef, RenderContext, validate_segment};
use std::fmt;

/// Aggregate function usable as a whole SELECT list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    Sum,
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AggregateFn::Count => "COUNT",
            AggregateFn::Sum => "SUM",
        })
    }
}

/// The SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectClause {
    /// `a, b, users.c`
    FlatColumns(Vec<ColumnRef>),
    /// `{table: [cols]}`, each column rendered as `<prefix><table>.<col>`.
    PerTableColumns(Vec<(String, Vec<ColumnRef>)>),
    /// `COUNT([DISTINCT] col)`, `COUNT(*)`, `SUM([DISTINCT] col)`
    Aggregate {
        func: AggregateFn,
        distinct: bool,
        column: Option<ColumnRef>,
    },
}

impl SelectClause {
    pub fn columns(columns: impl IntoColumns) -> ChainResult<Self> {
        Ok(SelectClause::FlatColumns(non_empty_columns(columns, "SELECT")?))
    }

    /// Columns grouped by the table they come from.
    pub fn per_table<I, T, C>(tables: I) -> ChainResult<Self>
    where
        I: IntoIterator<Item = (T, C)>,
        T: AsRef<str>,
        C: IntoColumns,
    {
        let mut groups = Vec::new();
        for (table, columns) in tables {
            let table = table.as_ref().trim().to_lowercase().replace(' ', "_");
            validate_segment(&table)?;
            let columns = non_empty_columns(columns, "SELECT")?;
            if let Some(qualified) = columns
                .iter()
                .find(|c| matches!(c, ColumnRef::Qualified { .. }))
            {
                return Err(ChainError::invalid_argument(format!(
                    "Column '{}' is already qualified; list it under its own table",
                    qualified.column()
                )));
            }
            groups.push((table, columns));
        }
        if groups.is_empty() {
            return Err(ChainError::invalid_argument(
                "SELECT requires at least one table",
            ));
        }
        Ok(SelectClause::PerTableColumns(groups))
    }

    /// `func([DISTINCT] column)`; a missing column means `*`.
    pub fn aggregate(func: AggregateFn, column: Option<&str>, distinct: bool) -> ChainResult<Self> {
        let column = match column.map(ColumnRef::parse).transpose()? {
            Some(ColumnRef::Star) | None => None,
            Some(c) => Some(c),
        };
        if column.is_none() && (distinct || func == AggregateFn::Sum) {
            return Err(ChainError::invalid_argument(format!(
                "{func}{} requires a column",
                if distinct { " DISTINCT" } else { "" }
            )));
        }
        Ok(SelectClause::Aggregate {
            func,
            distinct,
            column,
        })
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        match self {
            SelectClause::FlatColumns(columns) => ctx.column_list(columns),
            SelectClause::PerTableColumns(groups) => groups
                .iter()
                .flat_map(|(table, columns)| {
                    columns
                        .iter()
                        .map(move |c| format!("{}{}.{}", ctx.prefix, table, c.column()))
                })
                .collect::<Vec<_>>()
                .join(", "),
            SelectClause::Aggregate {
                func,
                distinct,
                column,
            } => {
                let inner = match column {
                    Some(c) => ctx.column(c),
                    None => "*".to_string(),
                };
                let distinct = if *distinct { "DISTINCT " } else { "" };
                format!("{func}({distinct}{inner})")
            }
        }
    }
}
