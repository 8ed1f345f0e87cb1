use crate::binding::{Bindings, KeyGen};
use crate::error::{ChainError, ChainResult};
use crate::ident::{ColumnRef, RenderContext};
use crate::value::Literal;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<>`
    LtGt,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// `IN (...)`
    In,
    /// `NOT IN (...)`
    NotIn,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `BETWEEN a AND b`
    Between,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::LtGt => "<>",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::Between => "BETWEEN",
        }
    }
}

impl FromStr for Operator {
    type Err = ChainError;

    /// Case-insensitive; runs of whitespace inside `NOT IN`/`NOT LIKE` are collapsed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        Ok(match normalized.as_str() {
            "=" => Operator::Eq,
            "!=" => Operator::Ne,
            "<>" => Operator::LtGt,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Gte,
            "<=" => Operator::Lte,
            "IN" => Operator::In,
            "NOT IN" => Operator::NotIn,
            "LIKE" => Operator::Like,
            "NOT LIKE" => Operator::NotLike,
            "BETWEEN" => Operator::Between,
            _ => {
                return Err(ChainError::invalid_argument(format!(
                    "Unknown operator '{s}'"
                )));
            }
        })
    }
}

impl TryFrom<&str> for Operator {
    type Error = ChainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// How a WHERE condition attaches to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    /// First condition of the statement.
    Plain,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    /// `col op :k`
    Compare(String),
    /// `col IS [NOT] NULL`
    Null { negated: bool },
    /// `col [NOT] IN (:k1, :k2, ...)`
    List(Vec<String>),
    /// `col BETWEEN :k1 AND :k2`
    Range(String, String),
    /// `(col op :k1 OR col op :k2 ...)`
    AnyOf(Vec<String>),
    /// Fixed truth value for empty lists.
    Constant(&'static str),
}

/// One WHERE condition.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    column: ColumnRef,
    operator: Operator,
    connector: Connector,
    predicate: Predicate,
    bindings: Bindings,
}

impl WhereClause {
    /// Build a condition, generating placeholder names from `keys`.
    ///
    /// An [`Literal::Array`] value binds one placeholder per element:
    /// `IN`/`NOT IN` render a list, `BETWEEN` needs exactly two elements, and any
    /// other operator expands to a parenthesized OR of single comparisons.
    /// `= NULL` and `!= NULL` render as `IS NULL` / `IS NOT NULL`.
    pub fn new(
        column: &str,
        operator: Operator,
        value: impl Into<Literal>,
        connector: Connector,
        keys: &mut KeyGen,
    ) -> ChainResult<Self> {
        let column = ColumnRef::parse(column)?;
        if column == ColumnRef::Star {
            return Err(ChainError::invalid_argument("Cannot filter on '*'"));
        }
        let seed = column.key_seed();
        let value = value.into();
        let mut bindings = Bindings::new();
        let mut bind = |value: Literal| {
            let key = keys.next_key(&seed);
            bindings.insert(&key, value);
            key
        };

        let predicate = match (operator, value) {
            (Operator::In | Operator::NotIn, Literal::Array(items)) if items.is_empty() => {
                Predicate::Constant(if operator == Operator::In { "1=0" } else { "1=1" })
            }
            (Operator::In | Operator::NotIn, Literal::Array(items)) => {
                Predicate::List(items.into_iter().map(&mut bind).collect())
            }
            (Operator::In | Operator::NotIn, single) => Predicate::List(vec![bind(single)]),
            (Operator::Between, Literal::Array(items)) if items.len() == 2 => {
                let mut items = items.into_iter();
                let low = bind(items.next().unwrap_or_default());
                let high = bind(items.next().unwrap_or_default());
                Predicate::Range(low, high)
            }
            (Operator::Between, _) => {
                return Err(ChainError::invalid_argument(
                    "BETWEEN requires exactly two values",
                ));
            }
            (_, Literal::Array(items)) if items.is_empty() => {
                return Err(ChainError::invalid_argument(format!(
                    "Operator {operator} given an empty value list"
                )));
            }
            (_, Literal::Array(items)) if items.len() == 1 => {
                Predicate::Compare(bind(items.into_iter().next().unwrap_or_default()))
            }
            (_, Literal::Array(items)) => {
                Predicate::AnyOf(items.into_iter().map(&mut bind).collect())
            }
            (Operator::Eq, Literal::Null) => Predicate::Null { negated: false },
            (Operator::Ne | Operator::LtGt, Literal::Null) => Predicate::Null { negated: true },
            (_, single) => Predicate::Compare(bind(single)),
        };

        Ok(Self {
            column,
            operator,
            connector,
            predicate,
            bindings,
        })
    }

    pub fn connector(&self) -> Connector {
        self.connector
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn column(&self) -> &ColumnRef {
        &self.column
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Render the condition without its connector.
    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        let col = ctx.column(&self.column);
        let op = self.operator.as_sql();
        match &self.predicate {
            Predicate::Compare(key) => format!("{col} {op} :{key}"),
            Predicate::Null { negated: false } => format!("{col} IS NULL"),
            Predicate::Null { negated: true } => format!("{col} IS NOT NULL"),
            Predicate::List(keys) => {
                let list = keys
                    .iter()
                    .map(|k| format!(":{k}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{col} {op} ({list})")
            }
            Predicate::Range(low, high) => format!("{col} BETWEEN :{low} AND :{high}"),
            Predicate::AnyOf(keys) => {
                let parts = keys
                    .iter()
                    .map(|k| format!("{col} {op} :{k}"))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                format!("({parts})")
            }
            Predicate::Constant(sql) => (*sql).to_string(),
        }
    }
}
