use super::*;
use crate::monitor::StatsMonitor;
use crate::row::Row;
use crate::test_support::{RecordingExecutor, handler, row};
use std::sync::mpsc;

fn bindings<const N: usize>(pairs: [(&str, Literal); N]) -> Bindings {
    pairs.into_iter().collect()
}

const SELECT_USER: &str = "SELECT * FROM users WHERE id = :id";

#[test]
fn test_staged_bindings_merge_and_clear() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new());
    h.bind("id", 1).bind_multiple([("name", "x")]);
    assert_eq!(h.staged_bindings().len(), 2);

    h.query(
        "UPDATE users SET name = :name WHERE id = :id AND age > :age",
        Some(bindings([("age", Literal::Int(18))])),
    )?;
    assert!(h.staged_bindings().is_empty());

    let (_, sent) = h.executor().calls().pop().expect("one call");
    assert_eq!(sent.get("id"), Some(&Literal::Int(1)));
    assert_eq!(sent.get("name"), Some(&Literal::text("x")));
    assert_eq!(sent.get("age"), Some(&Literal::Int(18)));
    Ok(())
}

#[test]
fn test_call_bindings_override_staged() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new());
    h.bind(":id", 1);
    h.query(SELECT_USER, Some(bindings([("id", Literal::Int(2))])))?;
    let (_, sent) = h.executor().calls().pop().expect("one call");
    assert_eq!(sent.get("id"), Some(&Literal::Int(2)));
    Ok(())
}

#[test]
fn test_stage_cleared_on_cache_hit_and_on_error() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new());
    h.executor().set_rows(vec![row(&[("id", 1)])]);
    h.bind("id", 1);
    h.query(SELECT_USER, None)?;
    h.bind("id", 1);
    h.query(SELECT_USER, None)?;
    assert!(h.last_query().is_some_and(|e| e.from_cache));
    assert!(h.staged_bindings().is_empty());

    h.executor().fail_with("boom");
    h.bind("id", 9);
    assert!(h.query("DELETE FROM users WHERE id = :id", None).is_err());
    assert!(h.staged_bindings().is_empty());
    Ok(())
}

#[test]
fn test_select_is_cached() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new());
    h.executor().set_rows(vec![row(&[("id", 1)])]);
    let params = || Some(bindings([("id", Literal::Int(1))]));

    let first = h.query(SELECT_USER, params())?;
    let second = h.query(SELECT_USER, params())?;
    assert_eq!(first, second);
    assert_eq!(h.executor().call_count(), 1);

    let log = h.log();
    assert_eq!(log.len(), 2);
    assert!(!log[0].from_cache);
    assert!(log[1].from_cache);
    assert_eq!(log[1].query, "SELECT * FROM users WHERE id = 1");
    assert_eq!(h.cache().tables(), vec!["users".to_string()]);
    Ok(())
}

#[test]
fn test_different_bindings_miss_the_cache() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new());
    h.query(SELECT_USER, Some(bindings([("id", Literal::Int(1))])))?;
    h.query(SELECT_USER, Some(bindings([("id", Literal::Int(2))])))?;
    assert_eq!(h.executor().call_count(), 2);
    assert_eq!(h.cache().len(), 2);
    Ok(())
}

#[test]
fn test_writes_invalidate_table() -> ChainResult<()> {
    for write in [
        "UPDATE users SET name = 'x' WHERE id = 1",
        "DELETE FROM users WHERE id = 1",
        "INSERT INTO users (name) VALUES ('x')",
    ] {
        let h = handler(ConnectionConfig::new());
        h.executor().set_affected(1);
        h.query(SELECT_USER, Some(bindings([("id", Literal::Int(1))])))?;
        h.query("SELECT * FROM posts", None)?;
        assert_eq!(h.cache().len(), 2);

        h.query(write, None)?;
        assert_eq!(h.cache().tables(), vec!["posts".to_string()], "{write}");

        h.query(SELECT_USER, Some(bindings([("id", Literal::Int(1))])))?;
        assert_eq!(h.executor().call_count(), 4, "{write}");
        assert!(h.last_query().is_some_and(|e| !e.from_cache));
    }
    Ok(())
}

#[test]
fn test_write_invalidates_joined_readers() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new());
    h.query(
        "SELECT users.id FROM users INNER JOIN posts ON users.id = posts.user_id",
        None,
    )?;
    assert_eq!(h.cache().len(), 1);
    h.query("DELETE FROM posts WHERE id = 3", None)?;
    assert!(h.cache().is_empty());
    Ok(())
}

#[test]
fn test_failed_write_keeps_cache() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new());
    h.query("SELECT * FROM users", None)?;
    h.executor().fail_with("locked");
    assert!(h.query("DELETE FROM users WHERE id = 1", None).is_err());
    assert_eq!(h.cache().len(), 1);
    Ok(())
}

#[test]
fn test_outcome_by_statement_kind() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new());
    assert_eq!(h.query("SELECT * FROM users", None)?, Outcome::Rows(None));

    h.executor().set_affected(3);
    assert_eq!(
        h.query("UPDATE users SET a = 1 WHERE b = 2", None)?,
        Outcome::Affected(3)
    );
    assert_eq!(
        h.query("INSERT INTO users (a) VALUES (1)", None)?,
        Outcome::Inserted(true)
    );
    assert_eq!(h.query("DROP TABLE IF EXISTS users", None)?, Outcome::Executed);

    h.executor().set_affected(0);
    assert_eq!(
        h.query("INSERT INTO users (a) VALUES (1)", None)?,
        Outcome::Inserted(false)
    );
    Ok(())
}

#[test]
fn test_executor_error_is_logged_and_returned() {
    let h = handler(ConnectionConfig::new());
    h.executor().fail_with("no such table: users");
    let err = h.query(SELECT_USER, Some(bindings([("id", Literal::Int(5))])))
        .unwrap_err();
    assert!(err.is_execution());
    assert!(err.to_string().contains("no such table: users"));

    let entry = h.last_query().expect("logged");
    assert_eq!(entry.query, "SELECT * FROM users WHERE id = 5");
    assert!(entry.error.is_some_and(|e| e.contains("no such table")));
    assert!(h.cache().is_empty());
}

#[test]
fn test_cache_disabled() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new().cache_enabled(false));
    h.query("SELECT * FROM users", None)?;
    h.query("SELECT * FROM users", None)?;
    assert_eq!(h.executor().call_count(), 2);
    assert!(h.cache().is_empty());

    h.cache().enable();
    h.query("SELECT * FROM users", None)?;
    h.query("SELECT * FROM users", None)?;
    assert_eq!(h.executor().call_count(), 3);
    Ok(())
}

#[test]
fn test_tableless_reads_are_not_cached() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new());
    h.query("SHOW TABLES", None)?;
    h.query("SHOW TABLES", None)?;
    assert_eq!(h.executor().call_count(), 2);
    Ok(())
}

#[test]
fn test_log_can_be_disabled_and_cleared() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new().log_queries(false));
    h.query("SELECT * FROM users", None)?;
    assert!(h.log().is_empty());
    assert!(h.last_query().is_none());

    let h = handler(ConnectionConfig::new());
    h.query("SELECT * FROM users", None)?;
    assert_eq!(h.log().len(), 1);
    h.clear_log();
    assert!(h.log().is_empty());
    Ok(())
}

#[test]
fn test_bindings_are_sanitized() -> ChainResult<()> {
    let h = handler(ConnectionConfig::new());
    h.query(
        "UPDATE users SET active = :active, note = :note, tags = :tags WHERE id = :id",
        Some(bindings([
            ("active", Literal::Bool(true)),
            ("note", Literal::text("   ")),
            ("tags", Literal::from(vec![1, 2])),
            ("id", Literal::Int(4)),
        ])),
    )?;
    let (_, sent) = h.executor().calls().pop().expect("one call");
    assert_eq!(sent.get("active"), Some(&Literal::Int(1)));
    assert_eq!(sent.get("note"), Some(&Literal::Null));
    assert_eq!(sent.get("tags"), Some(&Literal::text("[1,2]")));
    assert_eq!(
        h.last_query().map(|e| e.query),
        Some("UPDATE users SET active = 1, note = NULL, tags = '[1,2]' WHERE id = 4".to_string())
    );
    Ok(())
}

#[test]
fn test_monitor_receives_events() -> ChainResult<()> {
    let stats = Arc::new(StatsMonitor::new());
    let h = Arc::new(
        ConnectionHandler::new(RecordingExecutor::default(), ConnectionConfig::new())
            .with_monitor(Arc::clone(&stats)),
    );
    h.query("SELECT * FROM users", None)?;
    h.query("SELECT * FROM users", None)?;
    h.query("UPDATE users SET a = 1 WHERE id = 2", None)?;

    let snapshot = stats.stats();
    assert_eq!(snapshot.total_queries, 3);
    assert_eq!(snapshot.select_count, 2);
    assert_eq!(snapshot.update_count, 1);
    assert_eq!(snapshot.cache_hits, 1);
    assert_eq!(snapshot.cache_misses, 1);
    assert_eq!(snapshot.invalidations, 1);
    assert_eq!(snapshot.invalidated_entries, 1);
    assert_eq!(snapshot.slow_queries, 0);
    Ok(())
}

#[test]
fn test_slow_query_reported() -> ChainResult<()> {
    let stats = Arc::new(StatsMonitor::new());
    let config = ConnectionConfig::new().slow_query_threshold(Duration::ZERO);
    let h = ConnectionHandler::new(RecordingExecutor::default(), config)
        .with_monitor(Arc::clone(&stats));
    h.query("SELECT * FROM users", None)?;
    std::thread::sleep(Duration::from_millis(1));
    h.query("DELETE FROM users WHERE id = 1", None)?;
    assert!(stats.stats().slow_queries >= 1);
    Ok(())
}

#[test]
fn test_debug_omits_executor() {
    let h = handler(ConnectionConfig::new().table_prefix("p_"));
    let rendered = format!("{h:?}");
    assert!(rendered.starts_with("ConnectionHandler"));
    assert!(rendered.contains("p_"));
}

/// Reads a single `username` column. The first fetch reads, then parks until released.
struct PausingExecutor {
    username: Mutex<String>,
    fetched: Mutex<Option<mpsc::Sender<()>>>,
    resume: Mutex<Option<mpsc::Receiver<()>>>,
}

impl Executor for PausingExecutor {
    fn fetch(&self, _sql: &str, _bindings: &Bindings) -> ChainResult<Vec<Row>> {
        let username = self.username.lock().unwrap().clone();
        if let Some(fetched) = self.fetched.lock().unwrap().take() {
            fetched.send(()).unwrap();
            let resume = self.resume.lock().unwrap().take().unwrap();
            resume.recv().unwrap();
        }
        let mut row = Row::new();
        row.push("username", Literal::text(username));
        Ok(vec![row])
    }

    fn execute(&self, _sql: &str, _bindings: &Bindings) -> ChainResult<u64> {
        *self.username.lock().unwrap() = "new".to_string();
        Ok(1)
    }
}

#[test]
fn test_read_overlapping_write_is_not_cached() -> ChainResult<()> {
    let (fetched_tx, fetched_rx) = mpsc::channel();
    let (resume_tx, resume_rx) = mpsc::channel();
    let executor = PausingExecutor {
        username: Mutex::new("old".to_string()),
        fetched: Mutex::new(Some(fetched_tx)),
        resume: Mutex::new(Some(resume_rx)),
    };
    let h = ConnectionHandler::new(executor, ConnectionConfig::new()).into_shared();
    let select = "SELECT username FROM users WHERE id = 1";

    let reader = {
        let h = Arc::clone(&h);
        std::thread::spawn(move || h.query(select, None))
    };
    fetched_rx.recv().unwrap();
    h.query("UPDATE users SET username = 'new' WHERE id = 1", None)?;
    resume_tx.send(()).unwrap();

    let stale = reader.join().unwrap()?.into_rows().unwrap_or_default();
    assert_eq!(stale[0].get_as::<String>("username")?, "old");
    assert!(h.cache().is_empty());

    let fresh = h.query(select, None)?.into_rows().unwrap_or_default();
    assert_eq!(fresh[0].get_as::<String>("username")?, "new");
    assert!(h.last_query().is_some_and(|e| !e.from_cache));
    assert!(h.cache().has("users", &cache_key(select, &Bindings::new())));
    Ok(())
}
