//! End-to-end tour against an in-memory SQLite database.
//!
//! Run with `RUST_LOG=sqlchain=debug cargo run --example basic` to see every statement.

use sqlchain::monitor::{CompositeMonitor, StatsMonitor, TracingMonitor};
use sqlchain::{ConnectionConfig, ConnectionHandler, Literal, SqliteExecutor};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let config = ConnectionConfig::from_toml_str(
        r#"
        table_prefix = "demo_"
        dialect = "sqlite"
        slow_query_threshold_ms = 50
        "#,
    )?;

    let stats = Arc::new(StatsMonitor::new());
    let monitor = CompositeMonitor::new()
        .add(TracingMonitor::new().max_sql_length(200))
        .add_arc(stats.clone());

    let handler = ConnectionHandler::new(SqliteExecutor::open_in_memory()?, config)
        .with_monitor(monitor)
        .into_shared();
    let mut db = handler.builder();

    db.create_table(
        "users",
        [("username", "VARCHAR(255) | NOT NULL"), ("age", "INTEGER")],
    )
    .exec()?;
    db.create_table("posts", [("user_id", "INTEGER"), ("title", "TEXT")])
        .exec()?;

    for (name, age) in [("alice", 31), ("bob", 17), ("carol", 45)] {
        db.insert_into("users")
            .values([("username", Literal::text(name)), ("age", Literal::Int(age))])
            .exec()?;
    }
    db.insert_into("posts")
        .values([("user_id", Literal::Int(1)), ("title", Literal::text("hello"))])
        .exec()?;

    let adults = db
        .select("id, username")
        .from("users")
        .where_("age", ">=", 18)
        .order_by("username", "ASC")
        .find_all()?
        .unwrap_or_default();
    println!("adults: {}", serde_json::to_string(&adults)?);

    // served from cache
    db.select("id, username")
        .from("users")
        .where_("age", ">=", 18)
        .order_by("username", "ASC")
        .find_all()?;

    let with_posts = db
        .select("username, posts.title")
        .from("users")
        .left_join("posts", [("id", "user_id")])
        .where_("id", "=", 1)
        .find_all()?;
    println!("posts: {}", serde_json::to_string(&with_posts)?);

    db.update("users")
        .set([("age", 18)])
        .where_("username", "=", "bob")
        .exec()?;
    println!("adults now: {}", db.from("users").where_("age", ">=", 18).count()?);

    if let Err(err) = db.delete_from("users").exec() {
        println!("refused: {err}");
    }

    for entry in handler.log() {
        println!("{:>8.3}ms cache={} {}", entry.time * 1000.0, entry.from_cache, entry.query);
    }
    let summary = stats.stats();
    println!(
        "queries={} cache_hits={} hit_ratio={:.2} invalidations={}",
        summary.total_queries,
        summary.cache_hits,
        summary.cache_hit_ratio(),
        summary.invalidations
    );
    Ok(())
}
