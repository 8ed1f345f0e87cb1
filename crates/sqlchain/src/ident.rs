//! Identifier handling: validation, table resolution and column prefixing.
//!
//! Identifiers cannot be bound as parameters, so every table and column name that
//! ends up in emitted SQL goes through this module first.
//!
//! - Segments are validated against `[A-Za-z_][A-Za-z0-9_$]*`
//! - Table names are lower-cased, spaces become `_`, and the configured prefix is prepended
//! - Columns may be bare (`id`), dotted (`users.id`) or parenthetical (`users(id)`)
//!
//! # Example
//! ```
//! use sqlchain::{ColumnRef, RenderContext};
//!
//! let col = ColumnRef::parse("Users(id)")?;
//! let ctx = RenderContext::new("app_", "app_orders");
//! assert_eq!(ctx.column(&col), "app_users.id");
//! # Ok::<(), sqlchain::ChainError>(())
//! ```

use crate::error::{ChainError, ChainResult};
use std::str::FromStr;

/// Check a single unquoted identifier segment.
pub fn validate_segment(segment: &str) -> ChainResult<()> {
    let mut chars = segment.chars();
    match chars.next() {
        None => return Err(ChainError::invalid_argument("Empty identifier segment")),
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        Some(c) => {
            return Err(ChainError::invalid_argument(format!(
                "Invalid identifier start character '{c}' in '{segment}'"
            )));
        }
    }
    for c in chars {
        if !(c == '_' || c == '$' || c.is_ascii_alphanumeric()) {
            return Err(ChainError::invalid_argument(format!(
                "Invalid character '{c}' in identifier '{segment}'"
            )));
        }
    }
    Ok(())
}

/// Lower-case a table name and replace spaces with underscores.
fn normalize_table(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Resolve a user-supplied table name into the name emitted in SQL.
///
/// `"Order Items"` with prefix `"app_"` resolves to `app_order_items`.
pub fn resolve_table(name: &str, prefix: &str) -> ChainResult<String> {
    let normalized = normalize_table(name);
    validate_segment(&normalized)?;
    if !prefix.is_empty() {
        validate_segment(prefix)?;
    }
    Ok(format!("{prefix}{normalized}"))
}

/// A column reference as written by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// `*`
    Star,
    /// A bare column; belongs to the statement's base table.
    Bare(String),
    /// `table.column` or `table(column)`. `table` is normalized but not prefixed;
    /// `column` may be `*`.
    Qualified { table: String, column: String },
}

impl ColumnRef {
    /// Parse a column reference.
    pub fn parse(input: &str) -> ChainResult<Self> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ChainError::invalid_argument("Column name cannot be empty"));
        }
        if s == "*" {
            return Ok(ColumnRef::Star);
        }

        if let Some(inner) = s.strip_suffix(')') {
            let Some((table, column)) = inner.split_once('(') else {
                return Err(ChainError::invalid_argument(format!(
                    "Unbalanced parenthesis in column '{s}'"
                )));
            };
            return Self::qualified(table, column);
        }

        if let Some((table, column)) = s.split_once('.') {
            return Self::qualified(table, column);
        }

        validate_segment(s)?;
        Ok(ColumnRef::Bare(s.to_string()))
    }

    fn qualified(table: &str, column: &str) -> ChainResult<Self> {
        let table = normalize_table(table);
        validate_segment(&table)?;
        let column = column.trim();
        if column != "*" {
            validate_segment(column)?;
        }
        Ok(ColumnRef::Qualified {
            table,
            column: column.to_string(),
        })
    }

    /// The column part, without any table.
    pub fn column(&self) -> &str {
        match self {
            ColumnRef::Star => "*",
            ColumnRef::Bare(column) | ColumnRef::Qualified { column, .. } => column,
        }
    }

    /// Seed for placeholder names bound against this column.
    pub fn key_seed(&self) -> String {
        match self {
            ColumnRef::Star => String::new(),
            ColumnRef::Bare(column) => column.clone(),
            ColumnRef::Qualified { table, column } => format!("{table}_{column}"),
        }
    }

    /// Render with `prefix` applied to any explicit table; a bare column is
    /// qualified with `default_table` when one is given.
    pub fn render_with(&self, prefix: &str, default_table: Option<&str>) -> String {
        match self {
            ColumnRef::Star => "*".to_string(),
            ColumnRef::Bare(column) => match default_table {
                Some(table) => format!("{table}.{column}"),
                None => column.clone(),
            },
            ColumnRef::Qualified { table, column } => format!("{prefix}{table}.{column}"),
        }
    }
}

impl FromStr for ColumnRef {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnRef::parse(s)
    }
}

/// What a clause needs to know about its statement to render identifiers.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Table-name prefix from the connection configuration.
    pub prefix: &'a str,
    /// The statement's resolved (prefixed) base table.
    pub base_table: &'a str,
    /// Whether bare columns get qualified with `base_table`.
    pub qualify_bare: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(prefix: &'a str, base_table: &'a str) -> Self {
        Self {
            prefix,
            base_table,
            qualify_bare: false,
        }
    }

    /// Set whether bare columns are qualified with the base table.
    pub fn qualify_bare(mut self, qualify: bool) -> Self {
        self.qualify_bare = qualify;
        self
    }

    /// Render a column in this context.
    pub fn column(&self, column: &ColumnRef) -> String {
        let default_table = self.qualify_bare.then_some(self.base_table);
        column.render_with(self.prefix, default_table)
    }

    /// Render a comma-separated column list.
    pub fn column_list(&self, columns: &[ColumnRef]) -> String {
        columns
            .iter()
            .map(|c| self.column(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
