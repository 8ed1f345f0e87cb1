//! Named parameter bindings.
//!
//! Statements use `:name` placeholders. [`Bindings`] maps placeholder names (stored
//! without the leading colon) to [`Literal`] values, [`KeyGen`] hands out
//! placeholder names that never collide within one statement, and [`interpolate`]
//! substitutes literals back into the text for logs and cache keys.

use crate::error::ChainResult;
use crate::value::Literal;
use serde::Serialize;
use std::collections::btree_map;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Placeholder name -> value map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Bindings {
    entries: BTreeMap<String, Literal>,
}

fn normalize_name(name: &str) -> &str {
    name.strip_prefix(':').unwrap_or(name)
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` under `name`. A leading `:` on the name is ignored.
    ///
    /// Returns the previous value bound under the same name, if any.
    pub fn insert(&mut self, name: &str, value: impl Into<Literal>) -> Option<Literal> {
        self.entries
            .insert(normalize_name(name).to_string(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Literal> {
        self.entries.get(normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Placeholder names (without colon), in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Literal> {
        self.entries.iter()
    }

    /// Merge `other` into `self`; values from `other` win on name clashes.
    pub fn extend(&mut self, other: Bindings) {
        self.entries.extend(other.entries);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy of these bindings with every value passed through [`Literal::sanitized`].
    pub fn sanitized(&self) -> ChainResult<Bindings> {
        let mut entries = BTreeMap::new();
        for (name, value) in &self.entries {
            entries.insert(name.clone(), value.sanitized()?);
        }
        Ok(Bindings { entries })
    }
}

impl<K: AsRef<str>, V: Into<Literal>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (k, v) in iter {
            bindings.insert(k.as_ref(), v);
        }
        bindings
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = (&'a String, &'a Literal);
    type IntoIter = btree_map::Iter<'a, String, Literal>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Bindings {
    type Item = (String, Literal);
    type IntoIter = btree_map::IntoIter<String, Literal>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Generates placeholder names for one statement.
///
/// Names are derived from the column they bind (`users.id` -> `users_id_1`) so
/// logged SQL stays legible, with a per-stem counter. A generated name is
/// retried until it is not already taken, which also covers names reserved
/// up-front with [`KeyGen::reserve`].
#[derive(Debug, Clone, Default)]
pub struct KeyGen {
    used: HashSet<String>,
    counters: HashMap<String, u32>,
}

impl KeyGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a name as taken. Returns `false` if it already was.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.used.insert(normalize_name(name).to_string())
    }

    /// Next unused placeholder name for `column` (without colon).
    pub fn next_key(&mut self, column: &str) -> String {
        let stem = key_stem(column);
        loop {
            let counter = self.counters.entry(stem.clone()).or_insert(0);
            *counter += 1;
            let key = format!("{stem}_{counter}");
            if self.used.insert(key.clone()) {
                return key;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

fn key_stem(column: &str) -> String {
    let mut stem = String::with_capacity(column.len());
    for ch in column.chars() {
        if ch.is_ascii_alphanumeric() {
            stem.push(ch.to_ascii_lowercase());
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_matches('_');
    match stem.chars().next() {
        None => "p".to_string(),
        Some(c) if c.is_ascii_digit() => format!("p_{stem}"),
        Some(_) => stem.to_string(),
    }
}

/// Walk `sql`, splitting it into verbatim text and `:name` placeholders.
///
/// Placeholders inside string literals are text. `::` (cast syntax) is not a placeholder.
fn scan_placeholders<'a>(sql: &'a str, mut on_piece: impl FnMut(Piece<'a>)) {
    let bytes = sql.as_bytes();
    let mut i = 0;
    let mut text_start = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'\'' {
                        if i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                            i += 1;
                        } else {
                            break;
                        }
                    }
                    i += 1;
                }
                i += 1;
            }
            b':' if i + 1 < bytes.len() && bytes[i + 1] == b':' => i += 2,
            b':' if i + 1 < bytes.len()
                && (bytes[i + 1] == b'_' || bytes[i + 1].is_ascii_alphabetic()) =>
            {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && (bytes[end] == b'_' || bytes[end].is_ascii_alphanumeric())
                {
                    end += 1;
                }
                on_piece(Piece::Text(&sql[text_start..i]));
                on_piece(Piece::Placeholder(&sql[start..end]));
                i = end;
                text_start = end;
            }
            _ => i += 1,
        }
    }
    if text_start < sql.len() {
        on_piece(Piece::Text(&sql[text_start..]));
    }
}

/// Names of the `:name` placeholders in `sql`, in order of appearance.
pub fn placeholder_names(sql: &str) -> Vec<String> {
    let mut names = Vec::new();
    scan_placeholders(sql, |piece| {
        if let Piece::Placeholder(name) = piece {
            names.push(name.to_string());
        }
    });
    names
}

/// Substitute each bound `:name` placeholder with its SQL literal.
///
/// Unbound placeholders are left as-is. The output is for humans and cache keys
/// only; it is never what gets executed.
pub fn interpolate(sql: &str, bindings: &Bindings) -> String {
    let mut out = String::with_capacity(sql.len() + bindings.len() * 8);
    scan_placeholders(sql, |piece| {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Placeholder(name) => match bindings.get(name) {
                Some(value) => value.write_sql_literal(&mut out),
                None => {
                    out.push(':');
                    out.push_str(name);
                }
            },
        }
    });
    out
}

enum Piece<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_strips_colon() {
        let mut b = Bindings::new();
        b.insert(":id", 1);
        assert!(b.contains("id"));
        assert!(b.contains(":id"));
        assert_eq!(b.get("id"), Some(&Literal::Int(1)));
    }

    #[test]
    fn keygen_uses_column_stem() {
        let mut keys = KeyGen::new();
        assert_eq!(keys.next_key("id"), "id_1");
        assert_eq!(keys.next_key("id"), "id_2");
        assert_eq!(keys.next_key("users.user_name"), "users_user_name_1");
        assert_eq!(keys.next_key("Orders(Total)"), "orders_total_1");
        assert_eq!(keys.next_key("9lives"), "p_9lives_1");
        assert_eq!(keys.next_key("***"), "p_1");
    }

    #[test]
    fn keygen_retries_past_reserved_names() {
        let mut keys = KeyGen::new();
        assert!(keys.reserve(":id_1"));
        assert!(!keys.reserve("id_1"));
        assert_eq!(keys.next_key("id"), "id_2");
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn interpolate_by_name_not_position() {
        let mut b = Bindings::new();
        b.insert("id_10", 10);
        b.insert("id_1", 1);
        b.insert("name_1", "o'hara");
        let sql = "SELECT * FROM t WHERE id = :id_1 OR id = :id_10 AND name = :name_1";
        assert_eq!(
            interpolate(sql, &b),
            "SELECT * FROM t WHERE id = 1 OR id = 10 AND name = 'o''hara'"
        );
    }

    #[test]
    fn interpolate_skips_quoted_text_and_casts() {
        let mut b = Bindings::new();
        b.insert("x", 5);
        let sql = "SELECT ':x', a::text FROM t WHERE b = :x AND c = :missing";
        assert_eq!(
            interpolate(sql, &b),
            "SELECT ':x', a::text FROM t WHERE b = 5 AND c = :missing"
        );
    }

    #[test]
    fn interpolate_adjacent_and_trailing_placeholders() {
        let b: Bindings = [("a", Literal::Int(1)), ("b", Literal::Float(2.0))]
            .into_iter()
            .collect();
        assert_eq!(interpolate("SELECT :a||:b", &b), "SELECT 1||2.0");
        assert_eq!(interpolate("no placeholders", &b), "no placeholders");
        assert_eq!(interpolate("", &b), "");
    }

    #[test]
    fn placeholder_names_in_order() {
        let names = placeholder_names("INSERT INTO t (a, b) VALUES (:a_1, :b_1)");
        assert_eq!(names, vec!["a_1".to_string(), "b_1".to_string()]);
    }

    #[test]
    fn sanitized_bindings() {
        let b: Bindings = [("flag", Literal::Bool(true)), ("name", Literal::text(" "))]
            .into_iter()
            .collect();
        let s = b.sanitized().unwrap();
        assert_eq!(s.get("flag"), Some(&Literal::Int(1)));
        assert_eq!(s.get("name"), Some(&Literal::Null));
    }
}
