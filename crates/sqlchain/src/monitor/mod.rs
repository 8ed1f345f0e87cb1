//! Statement monitoring.
//!
//! A [`ConnectionHandler`](crate::ConnectionHandler) reports every statement it
//! runs to at most one [`QueryMonitor`]; use [`CompositeMonitor`] to fan out.
//!
//! # Example
//!
//! ```
//! use sqlchain::monitor::{CompositeMonitor, StatsMonitor, TracingMonitor};
//! use std::sync::Arc;
//!
//! let stats = Arc::new(StatsMonitor::new());
//! let monitor = CompositeMonitor::new()
//!     .add(TracingMonitor::new())
//!     .add_arc(stats.clone());
//! assert_eq!(monitor.len(), 2);
//! assert_eq!(stats.stats().total_queries, 0);
//! ```

mod monitors;
mod tracing_monitor;
mod types;

#[cfg(test)]
mod tests;

pub use monitors::{CompositeMonitor, NoopMonitor, QueryStats, StatsMonitor};
pub use tracing_monitor::TracingMonitor;
pub use types::{QueryContext, QueryMonitor, QueryResult, StatementKind};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
