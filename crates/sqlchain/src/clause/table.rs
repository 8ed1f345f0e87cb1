use crate::error::{ChainError, ChainResult};
use crate::ident::validate_segment;
use serde::{Deserialize, Serialize};

/// SQL dialect used for DDL phrasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    Sqlite,
}

/// Table name plus column definitions, for CREATE/DROP/TRUNCATE.
///
/// Column types are given as `"TYPE | MODIFIER | ..."`; the pipes are dropped on
/// render. An `id` primary key is always emitted first, so a caller-supplied
/// `id` column is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    table: String,
    columns: Vec<(String, String)>,
}

impl TableDefinition {
    /// Definition without columns, enough for DROP and TRUNCATE.
    ///
    /// `table` must already be resolved.
    pub fn named(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub fn new<I, K, V>(table: impl Into<String>, columns: I) -> ChainResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut definition = Self::named(table);
        for (name, spec) in columns {
            let name = name.as_ref().trim();
            validate_segment(name)?;
            if name.eq_ignore_ascii_case("id") {
                continue;
            }
            if definition.columns.iter().any(|(c, _)| c == name) {
                return Err(ChainError::invalid_argument(format!(
                    "Column '{name}' defined twice"
                )));
            }
            let spec = strip_type_spec(spec.as_ref())?;
            definition.columns.push((name.to_string(), spec));
        }
        Ok(definition)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn render_create(&self, dialect: Dialect) -> String {
        let mut parts = Vec::with_capacity(self.columns.len() + 2);
        parts.push(match dialect {
            Dialect::MySql => "id INT(11) NOT NULL AUTO_INCREMENT".to_string(),
            Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
        });
        parts.extend(self.columns.iter().map(|(name, spec)| format!("{name} {spec}")));
        match dialect {
            Dialect::MySql => {
                parts.push("PRIMARY KEY (id)".to_string());
                format!(
                    "CREATE TABLE IF NOT EXISTS {} ({}) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
                    self.table,
                    parts.join(", ")
                )
            }
            Dialect::Sqlite => format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                self.table,
                parts.join(", ")
            ),
        }
    }

    /// Same statement for MySQL and SQLite.
    pub fn render_drop(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table)
    }

    /// SQLite has no TRUNCATE; it is emulated with an unfiltered DELETE.
    pub fn render_truncate(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::MySql => format!("TRUNCATE TABLE {}", self.table),
            Dialect::Sqlite => format!("DELETE FROM {}", self.table),
        }
    }
}

/// `"VARCHAR(255) | NOT NULL"` -> `"VARCHAR(255) NOT NULL"`
fn strip_type_spec(spec: &str) -> ChainResult<String> {
    if spec.contains(';') || spec.contains("--") || spec.contains("/*") {
        return Err(ChainError::invalid_argument(format!(
            "Invalid column type '{spec}'"
        )));
    }
    let stripped = spec
        .split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if stripped.is_empty() {
        return Err(ChainError::invalid_argument("Column type cannot be empty"));
    }
    Ok(stripped)
}
