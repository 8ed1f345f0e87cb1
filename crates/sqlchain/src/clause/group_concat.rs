use crate::error::{ChainError, ChainResult};
use crate::ident::{ColumnRef, RenderContext, validate_segment};

/// `GROUP_CONCAT([DISTINCT] col) [AS alias]`, appended to the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupConcatClause {
    column: ColumnRef,
    alias: Option<String>,
    distinct: bool,
}

impl GroupConcatClause {
    pub fn new(column: &str, alias: Option<&str>, distinct: bool) -> ChainResult<Self> {
        let column = ColumnRef::parse(column)?;
        if column == ColumnRef::Star {
            return Err(ChainError::invalid_argument("Cannot GROUP_CONCAT '*'"));
        }
        let alias = alias
            .map(|a| {
                let a = a.trim();
                validate_segment(a).map(|()| a.to_string())
            })
            .transpose()?;
        Ok(Self {
            column,
            alias,
            distinct,
        })
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        let mut sql = format!("GROUP_CONCAT({distinct}{})", ctx.column(&self.column));
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
        sql
    }
}
