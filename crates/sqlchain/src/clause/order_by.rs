use super::{IntoColumns, non_empty_columns};
use crate::error::{ChainError, ChainResult};
use crate::ident::{ColumnRef, RenderContext};
use std::str::FromStr;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(ChainError::invalid_argument(format!(
                "Sort direction must be ASC or DESC, got '{s}'"
            ))),
        }
    }
}

/// `ORDER BY a, b DIR`
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    columns: Vec<ColumnRef>,
    direction: SortDirection,
}

impl OrderByClause {
    pub fn new(columns: impl IntoColumns, direction: SortDirection) -> ChainResult<Self> {
        let columns = non_empty_columns(columns, "ORDER BY")?;
        if columns.contains(&ColumnRef::Star) {
            return Err(ChainError::invalid_argument("Cannot ORDER BY '*'"));
        }
        Ok(Self { columns, direction })
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        format!(
            "ORDER BY {} {}",
            ctx.column_list(&self.columns),
            self.direction.as_sql()
        )
    }
}
