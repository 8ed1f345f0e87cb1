use super::types::{QueryContext, QueryMonitor, QueryResult, StatementKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A monitor that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl QueryMonitor for NoopMonitor {
    fn on_query_complete(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}

/// A monitor that tracks statement statistics.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    total_queries: AtomicU64,
    failed_queries: AtomicU64,
    total_duration_nanos: AtomicU64,
    max_duration_nanos: AtomicU64,
    slowest_query: Mutex<Option<String>>,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    ddl_count: AtomicU64,
    other_count: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    invalidations: AtomicU64,
    invalidated_entries: AtomicU64,
    slow_queries: AtomicU64,
}

/// Snapshot of [`StatsMonitor`] counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    pub total_queries: u64,
    pub failed_queries: u64,
    pub total_duration: Duration,
    pub max_duration: Duration,
    pub slowest_query: Option<String>,
    /// SELECT and SHOW statements.
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    /// CREATE, DROP and TRUNCATE statements.
    pub ddl_count: u64,
    pub other_count: u64,
    pub cache_hits: u64,
    /// Cacheable reads that had to go to the executor.
    pub cache_misses: u64,
    /// Writes that evicted a table bucket.
    pub invalidations: u64,
    pub invalidated_entries: u64,
    pub slow_queries: u64,
}

impl QueryStats {
    /// Share of cacheable reads answered from the cache, `0.0` if there were none.
    pub fn cache_hit_ratio(&self) -> f64 {
        let reads = self.cache_hits + self.cache_misses;
        if reads == 0 {
            0.0
        } else {
            self.cache_hits as f64 / reads as f64
        }
    }
}

fn saturating_add(counter: &AtomicU64, value: u64) {
    let prev = counter.fetch_add(value, Ordering::Relaxed);
    if prev.checked_add(value).is_none() {
        counter.store(u64::MAX, Ordering::Relaxed);
    }
}

impl StatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> QueryStats {
        QueryStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
            slowest_query: self
                .slowest_query
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            ddl_count: self.ddl_count.load(Ordering::Relaxed),
            other_count: self.other_count.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            invalidated_entries: self.invalidated_entries.load(Ordering::Relaxed),
            slow_queries: self.slow_queries.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.total_queries,
            &self.failed_queries,
            &self.total_duration_nanos,
            &self.max_duration_nanos,
            &self.select_count,
            &self.insert_count,
            &self.update_count,
            &self.delete_count,
            &self.ddl_count,
            &self.other_count,
            &self.cache_hits,
            &self.cache_misses,
            &self.invalidations,
            &self.invalidated_entries,
            &self.slow_queries,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *self
            .slowest_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl QueryMonitor for StatsMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let duration_nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        self.total_queries.fetch_add(1, Ordering::Relaxed);
        saturating_add(&self.total_duration_nanos, duration_nanos);

        let counter = match ctx.kind {
            StatementKind::Select | StatementKind::Show => &self.select_count,
            StatementKind::Insert => &self.insert_count,
            StatementKind::Update => &self.update_count,
            StatementKind::Delete => &self.delete_count,
            StatementKind::Create | StatementKind::Drop | StatementKind::Truncate => {
                &self.ddl_count
            }
            StatementKind::Other => &self.other_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if result.is_error() {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }
        if ctx.kind.is_cacheable() && ctx.table.is_some() && !ctx.from_cache && !result.is_error()
        {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }

        let mut current_max = self.max_duration_nanos.load(Ordering::Relaxed);
        while duration_nanos > current_max {
            match self.max_duration_nanos.compare_exchange_weak(
                current_max,
                duration_nanos,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    *self
                        .slowest_query
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner) = Some(ctx.sql.clone());
                    break;
                }
                Err(updated) => current_max = updated,
            }
        }
    }

    fn on_cache_hit(&self, _ctx: &QueryContext) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn on_cache_invalidated(&self, _table: &str, removed: usize) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        saturating_add(
            &self.invalidated_entries,
            u64::try_from(removed).unwrap_or(u64::MAX),
        );
    }

    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {
        self.slow_queries.fetch_add(1, Ordering::Relaxed);
    }
}

/// Fans every event out to several monitors.
#[derive(Default)]
pub struct CompositeMonitor {
    monitors: Vec<Arc<dyn QueryMonitor>>,
}

impl CompositeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitors.push(Arc::new(monitor));
        self
    }

    /// Add a shared monitor, e.g. a [`StatsMonitor`] the caller keeps reading.
    pub fn add_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitors.push(monitor);
        self
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl QueryMonitor for CompositeMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        for monitor in &self.monitors {
            monitor.on_query_complete(ctx, duration, result);
        }
    }

    fn on_cache_hit(&self, ctx: &QueryContext) {
        for monitor in &self.monitors {
            monitor.on_cache_hit(ctx);
        }
    }

    fn on_cache_invalidated(&self, table: &str, removed: usize) {
        for monitor in &self.monitors {
            monitor.on_cache_invalidated(table, removed);
        }
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        for monitor in &self.monitors {
            monitor.on_slow_query(ctx, duration);
        }
    }
}

impl<M: QueryMonitor + ?Sized> QueryMonitor for Arc<M> {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        (**self).on_query_complete(ctx, duration, result);
    }

    fn on_cache_hit(&self, ctx: &QueryContext) {
        (**self).on_cache_hit(ctx);
    }

    fn on_cache_invalidated(&self, table: &str, removed: usize) {
        (**self).on_cache_invalidated(table, removed);
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        (**self).on_slow_query(ctx, duration);
    }
}
