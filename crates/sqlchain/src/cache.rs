//! Read-result cache, bucketed by table.
//!
//! Results are stored under the table the statement reads from, keyed by a hash of
//! the statement text with its bindings substituted. Any write through the owning
//! handler evicts the whole bucket of the table it touches. Reads that join other
//! tables are also evicted when one of those tables is written.
//!
//! Cache operations never fail: a poisoned lock is recovered and a miss is the
//! worst outcome.

use crate::binding::{Bindings, interpolate};
use crate::row::Row;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

#[derive(Debug)]
struct CachedResult {
    rows: Vec<Row>,
    /// Every table the statement reads, primary bucket first.
    tables: Vec<String>,
}

#[derive(Debug, Default)]
struct CacheState {
    buckets: HashMap<String, HashMap<String, CachedResult>>,
    /// Bumped for a table every time it is invalidated.
    generations: HashMap<String, u64>,
    /// Bumped by a full clear.
    epoch: u64,
}

impl CacheState {
    fn generation(&self, table: &str) -> u64 {
        self.generations.get(table).copied().unwrap_or(0)
    }
}

/// Invalidation state of the tables a read depends on, taken before the read runs.
///
/// [`QueryCache::put_if_current`] refuses to store a result when any of those tables
/// was invalidated after the ticket was taken, so a read racing a write on another
/// thread cannot cache the pre-write rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTicket {
    epoch: u64,
    generations: Vec<(String, u64)>,
}

/// In-process result cache.
#[derive(Debug)]
pub struct QueryCache {
    enabled: AtomicBool,
    state: Mutex<CacheState>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl QueryCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            state: Mutex::new(CacheState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Stop serving and storing results. Existing entries are kept but still
    /// invalidated by writes.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn has(&self, table: &str, key: &str) -> bool {
        self.is_enabled()
            && self
                .lock()
                .buckets
                .get(table)
                .is_some_and(|bucket| bucket.contains_key(key))
    }

    pub fn get(&self, table: &str, key: &str) -> Option<Vec<Row>> {
        if !self.is_enabled() {
            return None;
        }
        self.lock()
            .buckets
            .get(table)
            .and_then(|bucket| bucket.get(key))
            .map(|entry| entry.rows.clone())
    }

    pub fn put(&self, table: &str, key: &str, rows: Vec<Row>) {
        self.put_reading(&[table.to_string()], key, rows);
    }

    /// Store a result that depends on several tables; `tables[0]` is the bucket.
    pub fn put_reading(&self, tables: &[String], key: &str, rows: Vec<Row>) {
        if !self.is_enabled() {
            return;
        }
        Self::store(&mut self.lock(), tables, key, rows);
    }

    /// Snapshot the invalidation state of `tables` ahead of a read.
    pub fn ticket(&self, tables: &[String]) -> CacheTicket {
        let state = self.lock();
        CacheTicket {
            epoch: state.epoch,
            generations: tables
                .iter()
                .map(|table| (table.clone(), state.generation(table)))
                .collect(),
        }
    }

    /// Like [`put_reading`](Self::put_reading), but only if none of the ticket's
    /// tables was invalidated since the ticket was taken. Returns whether the
    /// result was stored.
    pub fn put_if_current(
        &self,
        ticket: &CacheTicket,
        tables: &[String],
        key: &str,
        rows: Vec<Row>,
    ) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let mut state = self.lock();
        let current = state.epoch == ticket.epoch
            && ticket
                .generations
                .iter()
                .all(|(table, generation)| state.generation(table) == *generation);
        if current {
            Self::store(&mut state, tables, key, rows);
        }
        current
    }

    fn store(state: &mut CacheState, tables: &[String], key: &str, rows: Vec<Row>) {
        let Some(primary) = tables.first() else {
            return;
        };
        state.buckets.entry(primary.clone()).or_default().insert(
            key.to_string(),
            CachedResult {
                rows,
                tables: tables.to_vec(),
            },
        );
    }

    /// Evict every result that reads `table`. Returns the number of entries removed.
    pub fn invalidate(&self, table: &str) -> usize {
        let mut state = self.lock();
        *state.generations.entry(table.to_string()).or_default() += 1;
        let buckets = &mut state.buckets;
        let mut removed = buckets.remove(table).map_or(0, |bucket| bucket.len());
        for bucket in buckets.values_mut() {
            let before = bucket.len();
            bucket.retain(|_, entry| !entry.tables.iter().any(|t| t == table));
            removed += before - bucket.len();
        }
        buckets.retain(|_, bucket| !bucket.is_empty());
        removed
    }

    /// Clear one table's results, or everything.
    pub fn clear(&self, table: Option<&str>) {
        match table {
            Some(table) => {
                self.invalidate(table);
            }
            None => {
                let mut state = self.lock();
                state.buckets.clear();
                state.epoch += 1;
            }
        }
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.lock().buckets.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tables that currently have a bucket, sorted.
    pub fn tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self.lock().buckets.keys().cloned().collect();
        tables.sort();
        tables
    }
}

/// Cache key for a statement: SHA-256 of the SQL with bindings substituted by name.
pub fn cache_key(sql: &str, bindings: &Bindings) -> String {
    format!("{:x}", Sha256::digest(interpolate(sql, bindings).as_bytes()))
}

fn table_regex() -> &'static Regex {
    static TABLE_RE: OnceLock<Regex> = OnceLock::new();
    TABLE_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:FROM|INTO|UPDATE|JOIN|TABLE(?:\s+IF\s+(?:NOT\s+)?EXISTS)?)\s+([A-Za-z_][A-Za-z0-9_$.]*)",
        )
        .expect("invalid built-in table regex")
    })
}

/// Tables a statement names after `FROM`, `INTO`, `UPDATE`, `JOIN` or `TABLE`,
/// lower-cased, deduplicated, in order of appearance.
pub fn extract_tables(sql: &str) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for caps in table_regex().captures_iter(sql) {
        let table = caps[1].to_lowercase();
        if !tables.contains(&table) {
            tables.push(table);
        }
    }
    tables
}

/// The statement's primary table, i.e. the first one [`extract_tables`] finds.
pub fn extract_table(sql: &str) -> Option<String> {
    table_regex()
        .captures(sql)
        .map(|caps| caps[1].to_lowercase())
}
