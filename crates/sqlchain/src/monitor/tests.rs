use super::*;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_statement_kind_detection() {
    assert_eq!(StatementKind::from_sql("SELECT * FROM users"), StatementKind::Select);
    assert_eq!(StatementKind::from_sql("  select id FROM users"), StatementKind::Select);
    assert_eq!(
        StatementKind::from_sql("-- list\n/* all */ (SELECT 1)"),
        StatementKind::Select
    );
    assert_eq!(
        StatementKind::from_sql("WITH t AS (SELECT 1) SELECT * FROM t"),
        StatementKind::Select
    );
    assert_eq!(StatementKind::from_sql("SHOW TABLES"), StatementKind::Show);
    assert_eq!(StatementKind::from_sql("describe users"), StatementKind::Show);
    assert_eq!(
        StatementKind::from_sql("INSERT INTO users (a) VALUES (:a)"),
        StatementKind::Insert
    );
    assert_eq!(StatementKind::from_sql("REPLACE INTO users (a) VALUES (1)"), StatementKind::Insert);
    assert_eq!(StatementKind::from_sql("UPDATE users SET a = 1"), StatementKind::Update);
    assert_eq!(StatementKind::from_sql("DELETE FROM users"), StatementKind::Delete);
    assert_eq!(StatementKind::from_sql("CREATE TABLE t (id INT)"), StatementKind::Create);
    assert_eq!(StatementKind::from_sql("DROP TABLE IF EXISTS t"), StatementKind::Drop);
    assert_eq!(StatementKind::from_sql("TRUNCATE TABLE t"), StatementKind::Truncate);
    assert_eq!(StatementKind::from_sql("ALTER TABLE t ADD c INT"), StatementKind::Other);
    assert_eq!(StatementKind::from_sql("selection"), StatementKind::Other);
    assert_eq!(StatementKind::from_sql(""), StatementKind::Other);
}

#[test]
fn test_statement_kind_cache_flags() {
    assert!(StatementKind::Select.is_cacheable());
    assert!(StatementKind::Show.is_cacheable());
    assert!(!StatementKind::Insert.is_cacheable());
    for kind in [
        StatementKind::Insert,
        StatementKind::Update,
        StatementKind::Delete,
        StatementKind::Truncate,
        StatementKind::Drop,
    ] {
        assert!(kind.invalidates_cache(), "{kind} should invalidate");
    }
    assert!(!StatementKind::Select.invalidates_cache());
    assert!(!StatementKind::Create.invalidates_cache());
}

#[test]
fn test_query_result_error_truncation() {
    let long = "x".repeat(600);
    let QueryResult::Error(msg) = QueryResult::error(long) else {
        panic!("expected error variant");
    };
    assert_eq!(msg.len(), 515);
    assert!(msg.ends_with("..."));
}

#[test]
fn test_truncate_sql_bytes_respects_char_boundary() {
    assert_eq!(truncate_sql_bytes("héllo", 2), "h");
    assert_eq!(truncate_sql_bytes("abc", 10), "abc");
}

#[test]
fn test_stats_monitor_counts() {
    let stats = StatsMonitor::new();
    let read = QueryContext::new("SELECT * FROM users", StatementKind::Select)
        .with_table(Some("users".into()));

    stats.on_query_complete(&read, Duration::from_millis(5), &QueryResult::Rows(1));
    let hit = read.clone().from_cache(true);
    stats.on_cache_hit(&hit);
    stats.on_query_complete(&hit, Duration::from_millis(1), &QueryResult::Rows(1));

    let write = QueryContext::new("DELETE FROM users WHERE id = 1", StatementKind::Delete);
    stats.on_query_complete(&write, Duration::from_millis(9), &QueryResult::Affected(1));
    stats.on_cache_invalidated("users", 1);

    let failed = QueryContext::new("CREATE TABLE x", StatementKind::Create);
    stats.on_query_complete(&failed, Duration::from_millis(2), &QueryResult::error("boom"));

    let s = stats.stats();
    assert_eq!(s.total_queries, 4);
    assert_eq!(s.select_count, 2);
    assert_eq!(s.delete_count, 1);
    assert_eq!(s.ddl_count, 1);
    assert_eq!(s.failed_queries, 1);
    assert_eq!(s.cache_hits, 1);
    assert_eq!(s.cache_misses, 1);
    assert_eq!(s.cache_hit_ratio(), 0.5);
    assert_eq!(s.invalidations, 1);
    assert_eq!(s.invalidated_entries, 1);
    assert_eq!(s.total_duration, Duration::from_millis(17));
    assert_eq!(s.max_duration, Duration::from_millis(9));
    assert_eq!(s.slowest_query.as_deref(), Some("DELETE FROM users WHERE id = 1"));

    stats.reset();
    assert_eq!(stats.stats(), QueryStats::default());
}

#[test]
fn test_composite_monitor_fans_out() {
    let a = Arc::new(StatsMonitor::new());
    let b = Arc::new(StatsMonitor::new());
    let composite = CompositeMonitor::new()
        .add(NoopMonitor)
        .add_arc(a.clone())
        .add_arc(b.clone());
    assert_eq!(composite.len(), 3);

    let ctx = QueryContext::new("SELECT 1", StatementKind::Select);
    composite.on_query_complete(&ctx, Duration::from_millis(1), &QueryResult::Rows(1));
    composite.on_slow_query(&ctx, Duration::from_secs(2));
    composite.on_cache_hit(&ctx);

    for stats in [a.stats(), b.stats()] {
        assert_eq!(stats.total_queries, 1);
        assert_eq!(stats.slow_queries, 1);
        assert_eq!(stats.cache_hits, 1);
    }
}

#[test]
fn test_tracing_monitor_truncation() {
    let monitor = TracingMonitor::new().max_sql_length(10);
    assert_eq!(monitor.truncate_sql("SELECT * FROM users"), "SELECT * F...");
    assert_eq!(monitor.truncate_sql("SELECT 1"), "SELECT 1");
    let monitor = monitor.no_truncate();
    assert_eq!(monitor.truncate_sql("SELECT * FROM users"), "SELECT * FROM users");
}

#[test]
fn test_tracing_monitor_emits_without_subscriber() {
    let monitor = TracingMonitor::new().level(tracing::Level::INFO);
    let ctx = QueryContext::new("SELECT 1", StatementKind::Select);
    monitor.on_query_complete(&ctx, Duration::from_millis(1), &QueryResult::Rows(1));
    monitor.on_slow_query(&ctx, Duration::from_secs(1));
}
