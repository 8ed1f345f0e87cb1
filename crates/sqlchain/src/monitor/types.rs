use std::fmt;
use std::time::Duration;

/// The kind of statement being run, detected from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Show,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Truncate,
    /// Anything else (ALTER, PRAGMA, SET, ...)
    Other,
}

impl StatementKind {
    /// Detect the statement kind from SQL text.
    ///
    /// Leading whitespace, comments and parentheses are skipped. `WITH ...` is
    /// treated as a read, `REPLACE` as an insert, and `DESCRIBE`/`EXPLAIN` like `SHOW`.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        const KEYWORDS: &[(&str, StatementKind)] = &[
            ("SELECT", StatementKind::Select),
            ("WITH", StatementKind::Select),
            ("SHOW", StatementKind::Show),
            ("DESCRIBE", StatementKind::Show),
            ("DESC", StatementKind::Show),
            ("EXPLAIN", StatementKind::Show),
            ("INSERT", StatementKind::Insert),
            ("REPLACE", StatementKind::Insert),
            ("UPDATE", StatementKind::Update),
            ("DELETE", StatementKind::Delete),
            ("CREATE", StatementKind::Create),
            ("DROP", StatementKind::Drop),
            ("TRUNCATE", StatementKind::Truncate),
        ];
        KEYWORDS
            .iter()
            .find(|(kw, _)| starts_with_keyword(trimmed, kw))
            .map_or(StatementKind::Other, |(_, kind)| *kind)
    }

    /// SELECT and SHOW results may be served from the cache.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, StatementKind::Select | StatementKind::Show)
    }

    /// Statements after which cached reads of the target table are stale.
    pub fn invalidates_cache(&self) -> bool {
        matches!(
            self,
            StatementKind::Insert
                | StatementKind::Update
                | StatementKind::Delete
                | StatementKind::Truncate
                | StatementKind::Drop
        )
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementKind::Select => "SELECT",
            StatementKind::Show => "SHOW",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Create => "CREATE",
            StatementKind::Drop => "DROP",
            StatementKind::Truncate => "TRUNCATE",
            StatementKind::Other => "OTHER",
        })
    }
}

fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            match s.find('\n') {
                Some(pos) => s = &s[pos + 1..],
                None => return "",
            }
            continue;
        }
        if s.starts_with("/*") {
            match s.find("*/") {
                Some(pos) => s = &s[pos + 2..],
                None => return "",
            }
            continue;
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            return s;
        }
    }
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    let Some(head) = s.get(..keyword.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(keyword) {
        return false;
    }
    s[keyword.len()..]
        .chars()
        .next()
        .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'))
}

/// What a monitor is told about a statement.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// SQL with bindings substituted, as written to the query log.
    pub sql: String,
    pub kind: StatementKind,
    /// Cache bucket the statement belongs to, if a table could be extracted.
    pub table: Option<String>,
    pub param_count: usize,
    /// Whether the result came from the cache.
    pub from_cache: bool,
}

impl QueryContext {
    pub fn new(sql: impl Into<String>, kind: StatementKind) -> Self {
        Self {
            sql: sql.into(),
            kind,
            table: None,
            param_count: 0,
            from_cache: false,
        }
    }

    pub fn with_table(mut self, table: Option<String>) -> Self {
        self.table = table;
        self
    }

    pub fn with_param_count(mut self, count: usize) -> Self {
        self.param_count = count;
        self
    }

    pub fn from_cache(mut self, from_cache: bool) -> Self {
        self.from_cache = from_cache;
        self
    }
}

const MAX_ERROR_LEN: usize = 512;

/// Result summary handed to monitors.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Rows returned.
    Rows(usize),
    /// Rows affected by a write.
    Affected(u64),
    /// DDL or other statement without a count.
    Executed,
    /// Failure, message truncated to 512 bytes.
    Error(String),
}

impl QueryResult {
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.len() > MAX_ERROR_LEN {
            Self::Error(format!("{}...", super::truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
        } else {
            Self::Error(msg)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error(_))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Executed => f.write_str("ok"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Hooks into statement execution.
///
/// Only `on_query_complete` is required. Calls happen synchronously on the
/// thread running the statement, so implementations should be cheap.
pub trait QueryMonitor: Send + Sync {
    /// Called once per statement, including cache hits and failures.
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult);

    /// Called when a read was answered from the cache.
    fn on_cache_hit(&self, _ctx: &QueryContext) {}

    /// Called when a write evicted `removed` cached results of `table`.
    fn on_cache_invalidated(&self, _table: &str, _removed: usize) {}

    /// Called when a statement ran longer than the configured threshold.
    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {}
}
