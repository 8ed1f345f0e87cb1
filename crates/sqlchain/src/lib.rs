//! # sqlchain
//!
//! A fluent SQL statement builder with a caching, logging connection handler.
//!
//! ## Features
//!
//! - **Chained building**: `select().from().where_().or_where().order_by().limit()`
//! - **Named placeholders**: every value is bound as `:column_N`, never spliced into SQL
//! - **Safe defaults**: DELETE and UPDATE require WHERE, UPDATE requires SET
//! - **Result cache**: SELECT results are cached per table and evicted by writes
//! - **Query log**: every statement is logged with its literal-substituted SQL and timing
//! - **Monitoring**: plug in [`monitor::StatsMonitor`], [`monitor::TracingMonitor`] or your own
//!
//! ## Usage
//!
//! ```ignore
//! use sqlchain::{ConnectionConfig, ConnectionHandler, SqliteExecutor};
//!
//! let handler = ConnectionHandler::new(
//!     SqliteExecutor::open_in_memory()?,
//!     ConnectionConfig::sqlite().table_prefix("app_"),
//! )
//! .into_shared();
//!
//! let mut users = handler.builder();
//! users
//!     .create_table("users", [("username", "VARCHAR(255) | NOT NULL")])
//!     .exec()?;
//! users.insert_into("users").values([("username", "alice")]).exec()?;
//!
//! let alice = users
//!     .select("id, username")
//!     .from("users")
//!     .where_("username", "=", "alice")
//!     .row()?;
//! ```
//!
//! Statements can also be sent directly, with staged bindings:
//!
//! ```ignore
//! handler.bind("id", 1).query("SELECT * FROM app_users WHERE id = :id", None)?;
//! ```

pub mod binding;
pub mod builder;
pub mod cache;
pub mod clause;
pub mod error;
pub mod executor;
pub mod handler;
pub mod ident;
pub mod monitor;
pub mod query;
pub mod row;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod value;

#[cfg(test)]
pub(crate) mod test_support;

pub use binding::{Bindings, KeyGen, interpolate, placeholder_names};
pub use builder::Builder;
pub use cache::{CacheTicket, QueryCache, cache_key, extract_table, extract_tables};
pub use clause::{
    AggregateFn, Connector, Dialect, GroupByClause, GroupConcatClause, IntoColumns, JoinClause,
    JoinKind, LimitClause, Operator, OrderByClause, SelectClause, SetClause, SortDirection,
    TableDefinition, ValuesClause, WhereClause,
};
pub use error::{ChainError, ChainResult};
pub use executor::{Executor, Outcome};
pub use handler::{ConnectionConfig, ConnectionHandler, LogEntry, QueryLog};
pub use ident::{ColumnRef, RenderContext, resolve_table};
pub use monitor::{
    CompositeMonitor, NoopMonitor, QueryContext, QueryMonitor, QueryResult, QueryStats,
    StatementKind, StatsMonitor, TracingMonitor,
};
pub use query::{Operation, QueryState, RenderedQuery};
pub use row::{FromRow, Row};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExecutor;
pub use value::{Literal, LiteralTypeError};
