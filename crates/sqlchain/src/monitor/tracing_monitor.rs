use super::truncate_sql_bytes;
use super::types::{QueryContext, QueryMonitor, QueryResult};
use std::time::Duration;
use tracing::Level;

/// Emits one `tracing` event per statement on target `sqlchain.sql`.
///
/// Slow statements additionally produce a `WARN` event regardless of `level`.
#[derive(Debug, Clone)]
pub struct TracingMonitor {
    /// Event level for completed statements.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingMonitor {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

impl QueryMonitor for TracingMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(&ctx.sql);
        let table = ctx.table.as_deref().unwrap_or("-");
        emit_at_level!(
            self.level,
            target: "sqlchain.sql",
            kind = %ctx.kind,
            table,
            param_count = ctx.param_count,
            from_cache = ctx.from_cache,
            elapsed_ms = duration.as_secs_f64() * 1000.0,
            result = %result,
            sql = %sql,
        );
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        tracing::warn!(
            target: "sqlchain.sql",
            kind = %ctx.kind,
            elapsed_ms = duration.as_secs_f64() * 1000.0,
            sql = %self.truncate_sql(&ctx.sql),
            "slow query"
        );
    }
}
