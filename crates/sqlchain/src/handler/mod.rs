//! Connection-level execution: binding, caching, logging.
//!
//! [`ConnectionHandler::query`] is the single path every statement takes on its
//! way to the [`Executor`]:
//!
//! 1. staged bindings (from [`bind`](ConnectionHandler::bind)) are merged with the
//!    call's bindings, and the stage is cleared
//! 2. SELECT/SHOW statements are looked up in the [`QueryCache`]
//! 3. on a miss, sanitized bindings go to the executor and read results are stored
//! 4. writes evict the cache bucket of the table they touch
//! 5. a [`LogEntry`] is appended whatever the outcome

mod config;
mod log;

#[cfg(test)]
mod tests;

pub use config::ConnectionConfig;
pub use log::{LogEntry, QueryLog};

use crate::binding::{Bindings, interpolate};
use crate::builder::Builder;
use crate::cache::{QueryCache, cache_key, extract_tables};
use crate::error::ChainResult;
use crate::executor::{Executor, Outcome};
use crate::monitor::{QueryContext, QueryMonitor, QueryResult, StatementKind};
use crate::query::QueryState;
use crate::value::Literal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Executes statements for one database connection.
///
/// Shared behind an [`Arc`] by every [`Builder`] and [`QueryState`] bound to it.
/// All methods take `&self`; the cache, the log and the staged bindings are
/// guarded internally.
pub struct ConnectionHandler<E> {
    executor: E,
    config: ConnectionConfig,
    cache: QueryCache,
    log: QueryLog,
    staged: Mutex<Bindings>,
    monitor: Option<Arc<dyn QueryMonitor>>,
}

/// Everything recorded about a finished statement.
struct Completed<'a> {
    kind: StatementKind,
    table: Option<&'a str>,
    readable: String,
    bindings: Bindings,
    elapsed: Duration,
    from_cache: bool,
    result: QueryResult,
}

impl<E: Executor> ConnectionHandler<E> {
    pub fn new(executor: E, config: ConnectionConfig) -> Self {
        let cache = QueryCache::new(config.cache_enabled);
        Self {
            executor,
            config,
            cache,
            log: QueryLog::new(),
            staged: Mutex::new(Bindings::new()),
            monitor: None,
        }
    }

    /// Report every statement to `monitor`. Replaces any previous monitor.
    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Some(Arc::new(monitor));
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// A fluent builder bound to this handler.
    pub fn builder(self: &Arc<Self>) -> Builder<E> {
        Builder::new(Arc::clone(self))
    }

    /// A bare statement accumulator bound to this handler.
    pub fn query_state(self: &Arc<Self>) -> QueryState<E> {
        QueryState::new(Arc::clone(self))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn lock_staged(&self) -> MutexGuard<'_, Bindings> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stage a binding for the next [`query`](Self::query) call.
    pub fn bind(&self, name: &str, value: impl Into<Literal>) -> &Self {
        self.lock_staged().insert(name, value);
        self
    }

    /// Stage several bindings for the next [`query`](Self::query) call.
    pub fn bind_multiple<I, K, V>(&self, bindings: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Literal>,
    {
        let mut staged = self.lock_staged();
        for (name, value) in bindings {
            staged.insert(name.as_ref(), value);
        }
        drop(staged);
        self
    }

    /// Bindings staged for the next statement.
    pub fn staged_bindings(&self) -> Bindings {
        self.lock_staged().clone()
    }

    /// Run one statement.
    ///
    /// SELECT/SHOW return [`Outcome::Rows`], INSERT [`Outcome::Inserted`],
    /// CREATE/DROP/TRUNCATE [`Outcome::Executed`] and everything else
    /// [`Outcome::Affected`]. Executor errors are returned unchanged.
    pub fn query(&self, sql: &str, bindings: Option<Bindings>) -> ChainResult<Outcome> {
        let mut merged = std::mem::take(&mut *self.lock_staged());
        if let Some(bindings) = bindings {
            merged.extend(bindings);
        }

        let started = Instant::now();
        let kind = StatementKind::from_sql(sql);
        let tables = extract_tables(sql);
        let table = tables.first().map(String::as_str);

        let sanitized = match merged.sanitized() {
            Ok(sanitized) => sanitized,
            Err(err) => {
                self.record(Completed {
                    kind,
                    table,
                    readable: interpolate(sql, &merged),
                    bindings: merged,
                    elapsed: started.elapsed(),
                    from_cache: false,
                    result: QueryResult::error(err.to_string()),
                });
                return Err(err);
            }
        };
        let readable = interpolate(sql, &sanitized);

        let key = match table {
            Some(_) if kind.is_cacheable() && self.cache.is_enabled() => {
                Some(cache_key(sql, &merged))
            }
            _ => None,
        };

        if let (Some(table), Some(key)) = (table, key.as_deref()) {
            if let Some(rows) = self.cache.get(table, key) {
                tracing::trace!(target: "sqlchain.cache", table, rows = rows.len(), "cache hit");
                self.record(Completed {
                    kind,
                    table: Some(table),
                    readable,
                    bindings: sanitized,
                    elapsed: started.elapsed(),
                    from_cache: true,
                    result: QueryResult::Rows(rows.len()),
                });
                return Ok(Outcome::from_rows(rows));
            }
        }

        let result = if kind.is_cacheable() {
            let ticket = key.as_ref().map(|_| self.cache.ticket(&tables));
            self.executor.fetch(sql, &sanitized).map(|rows| {
                if let (Some(table), Some(key), Some(ticket)) = (table, key.as_deref(), &ticket) {
                    if self.cache.put_if_current(ticket, &tables, key, rows.clone()) {
                        tracing::trace!(target: "sqlchain.cache", table, rows = rows.len(), "cache store");
                    } else {
                        tracing::trace!(target: "sqlchain.cache", table, "skipped store after concurrent write");
                    }
                }
                Outcome::from_rows(rows)
            })
        } else {
            self.executor
                .execute(sql, &sanitized)
                .map(|count| match kind {
                    StatementKind::Insert => Outcome::Inserted(count > 0),
                    StatementKind::Create | StatementKind::Drop | StatementKind::Truncate => {
                        Outcome::Executed
                    }
                    _ => Outcome::Affected(count),
                })
        };
        let elapsed = started.elapsed();

        if result.is_ok() && kind.invalidates_cache() {
            if let Some(table) = table {
                self.invalidate(table);
            }
        }

        let summary = match &result {
            Ok(Outcome::Rows(rows)) => QueryResult::Rows(rows.as_ref().map_or(0, Vec::len)),
            Ok(Outcome::Affected(n)) => QueryResult::Affected(*n),
            Ok(Outcome::Inserted(ok)) => QueryResult::Affected(u64::from(*ok)),
            Ok(Outcome::Executed) => QueryResult::Executed,
            Err(err) => QueryResult::error(err.to_string()),
        };
        self.record(Completed {
            kind,
            table,
            readable,
            bindings: sanitized,
            elapsed,
            from_cache: false,
            result: summary,
        });

        result
    }

    fn invalidate(&self, table: &str) {
        let removed = self.cache.invalidate(table);
        tracing::debug!(target: "sqlchain.cache", table, removed, "cache bucket invalidated");
        if let Some(monitor) = &self.monitor {
            monitor.on_cache_invalidated(table, removed);
        }
    }

    fn record(&self, done: Completed<'_>) {
        let elapsed_ms = done.elapsed.as_secs_f64() * 1000.0;
        match &done.result {
            QueryResult::Error(error) => tracing::debug!(
                target: "sqlchain.sql",
                kind = %done.kind,
                elapsed_ms,
                error = %error,
                sql = %done.readable,
                "statement failed"
            ),
            result => tracing::debug!(
                target: "sqlchain.sql",
                kind = %done.kind,
                from_cache = done.from_cache,
                elapsed_ms,
                result = %result,
                sql = %done.readable,
                "statement"
            ),
        }

        let slow = !done.from_cache
            && self
                .config
                .slow_query_threshold
                .is_some_and(|threshold| done.elapsed > threshold);
        if slow {
            tracing::warn!(
                target: "sqlchain.sql",
                kind = %done.kind,
                elapsed_ms,
                sql = %done.readable,
                "slow query"
            );
        }

        if let Some(monitor) = &self.monitor {
            let ctx = QueryContext::new(done.readable.clone(), done.kind)
                .with_table(done.table.map(str::to_string))
                .with_param_count(done.bindings.len())
                .from_cache(done.from_cache);
            if done.from_cache {
                monitor.on_cache_hit(&ctx);
            }
            monitor.on_query_complete(&ctx, done.elapsed, &done.result);
            if slow {
                monitor.on_slow_query(&ctx, done.elapsed);
            }
        }

        if self.config.log_queries {
            let error = match done.result {
                QueryResult::Error(error) => Some(error),
                _ => None,
            };
            self.log.push(LogEntry {
                query: done.readable,
                bindings: done.bindings,
                time: done.elapsed.as_secs_f64(),
                from_cache: done.from_cache,
                error,
            });
        }
    }

    /// Snapshot of the query log.
    pub fn log(&self) -> Vec<LogEntry> {
        self.log.entries()
    }

    pub fn clear_log(&self) {
        self.log.clear();
    }

    /// The most recent log entry.
    pub fn last_query(&self) -> Option<LogEntry> {
        self.log.last()
    }
}

impl<E> std::fmt::Debug for ConnectionHandler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandler")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("log", &self.log)
            .field("has_monitor", &self.monitor.is_some())
            .finish_non_exhaustive()
    }
}
