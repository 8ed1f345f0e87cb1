use super::{IntoColumns, non_empty_columns};
use crate::error::{ChainError, ChainResult};
use crate::ident::{ColumnRef, RenderContext};

/// `GROUP BY a, users.b`
#[derive(Debug, Clone, PartialEq)]
pub struct GroupByClause {
    columns: Vec<ColumnRef>,
}

impl GroupByClause {
    pub fn new(columns: impl IntoColumns) -> ChainResult<Self> {
        let columns = non_empty_columns(columns, "GROUP BY")?;
        if columns.contains(&ColumnRef::Star) {
            return Err(ChainError::invalid_argument("Cannot GROUP BY '*'"));
        }
        Ok(Self { columns })
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        format!("GROUP BY {}", ctx.column_list(&self.columns))
    }
}
