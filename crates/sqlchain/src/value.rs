//! Literal values carried by bindings and rows.
//!
//! [`Literal`] is the closed set of value types the executor contract supports:
//! `NULL`, booleans, integers, floats, text, plus arrays which are flattened or
//! serialized before they reach a driver.

use crate::error::ChainResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A literal SQL value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Array(Vec<Literal>),
}

/// Returned when a [`Literal`] cannot be converted into the requested Rust type.
#[derive(Debug, Clone, Error)]
#[error("expected {expected}, found {found}")]
pub struct LiteralTypeError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl Literal {
    /// Create a text literal.
    pub fn text(value: impl Into<String>) -> Self {
        Literal::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Short type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Text(_) => "text",
            Literal::Array(_) => "array",
        }
    }

    /// Normalize a value for binding against a driver.
    ///
    /// - booleans become `0`/`1`
    /// - empty or whitespace-only text becomes `NULL`
    /// - arrays are serialized to JSON text
    pub fn sanitized(&self) -> ChainResult<Literal> {
        Ok(match self {
            Literal::Bool(b) => Literal::Int(i64::from(*b)),
            Literal::Text(s) if s.trim().is_empty() => Literal::Null,
            Literal::Array(items) => Literal::Text(serialize_array(items)?),
            other => other.clone(),
        })
    }

    /// Render the value as an SQL literal for human-readable output.
    ///
    /// Text is single-quoted with embedded quotes doubled; arrays are flattened
    /// into a comma-separated list of their rendered items.
    pub fn to_sql_literal(&self) -> String {
        let mut out = String::new();
        self.write_sql_literal(&mut out);
        out
    }

    pub(crate) fn write_sql_literal(&self, out: &mut String) {
        match self {
            Literal::Null => out.push_str("NULL"),
            Literal::Bool(true) => out.push_str("TRUE"),
            Literal::Bool(false) => out.push_str("FALSE"),
            Literal::Int(v) => out.push_str(&v.to_string()),
            // `{:?}` keeps the fraction: 1.0 stays distinct from the integer 1.
            Literal::Float(v) => out.push_str(&format!("{v:?}")),
            Literal::Text(s) => {
                out.push('\'');
                for ch in s.chars() {
                    if ch == '\'' {
                        out.push('\'');
                    }
                    out.push(ch);
                }
                out.push('\'');
            }
            Literal::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_sql_literal(out);
                }
            }
        }
    }
}

/// Serialize array items to the JSON text stored in a single column.
pub fn serialize_array(items: &[Literal]) -> ChainResult<String> {
    Ok(serde_json::to_string(items)?)
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_literal())
    }
}

// ==================== Conversions into Literal ====================

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Literal {
                fn from(v: $t) -> Self {
                    Literal::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Literal {
    fn from(v: f32) -> Self {
        Literal::Float(f64::from(v))
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Text(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Text(v)
    }
}

impl From<&String> for Literal {
    fn from(v: &String) -> Self {
        Literal::Text(v.clone())
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(v: Option<T>) -> Self {
        v.map_or(Literal::Null, Into::into)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(v: Vec<T>) -> Self {
        Literal::Array(v.into_iter().map(Into::into).collect())
    }
}

// ==================== Conversions out of Literal ====================

impl TryFrom<Literal> for i64 {
    type Error = LiteralTypeError;

    fn try_from(value: Literal) -> Result<Self, Self::Error> {
        match value {
            Literal::Int(v) => Ok(v),
            Literal::Bool(b) => Ok(i64::from(b)),
            other => Err(LiteralTypeError {
                expected: "int",
                found: other.type_name(),
            }),
        }
    }
}

impl TryFrom<Literal> for f64 {
    type Error = LiteralTypeError;

    fn try_from(value: Literal) -> Result<Self, Self::Error> {
        match value {
            Literal::Float(v) => Ok(v),
            // Lossy above 2^53, same as any driver-side coercion.
            Literal::Int(v) => Ok(v as f64),
            other => Err(LiteralTypeError {
                expected: "float",
                found: other.type_name(),
            }),
        }
    }
}

impl TryFrom<Literal> for bool {
    type Error = LiteralTypeError;

    fn try_from(value: Literal) -> Result<Self, Self::Error> {
        match value {
            Literal::Bool(b) => Ok(b),
            Literal::Int(v) => Ok(v != 0),
            other => Err(LiteralTypeError {
                expected: "bool",
                found: other.type_name(),
            }),
        }
    }
}

impl TryFrom<Literal> for String {
    type Error = LiteralTypeError;

    fn try_from(value: Literal) -> Result<Self, Self::Error> {
        match value {
            Literal::Text(s) => Ok(s),
            other => Err(LiteralTypeError {
                expected: "text",
                found: other.type_name(),
            }),
        }
    }
}
