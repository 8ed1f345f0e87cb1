//! Fluent, reusable statement builder.
//!
//! [`Builder`] wraps a [`QueryState`] so calls can be chained without `?` after
//! every step. The first setter error is kept and returned by the next terminal
//! call; later setters are ignored until then.
//!
//! Every terminal call (`exec`, `find`, `row`, `find_all`, `count`, `paginate`)
//! consumes the accumulated state, so the builder starts fresh afterwards whether
//! the statement succeeded or not.
//!
//! ```ignore
//! let users = handler
//!     .builder()
//!     .select("id, username")
//!     .from("users")
//!     .where_("age", ">=", 18)
//!     .or_where("role", "=", "admin")
//!     .order_by("id", "DESC")
//!     .limit(10)
//!     .find_all()?;
//! ```

use crate::clause::{AggregateFn, IntoColumns, JoinKind, SelectClause};
use crate::error::{ChainError, ChainResult};
use crate::executor::{Executor, Outcome};
use crate::handler::ConnectionHandler;
use crate::query::{QueryState, RenderedQuery};
use crate::row::{FromRow, Row};
use crate::value::Literal;
use std::sync::Arc;

/// Chainable front end over [`QueryState`].
pub struct Builder<E> {
    handler: Arc<ConnectionHandler<E>>,
    state: QueryState<E>,
    error: Option<ChainError>,
}

impl<E: Executor> Builder<E> {
    pub fn new(handler: Arc<ConnectionHandler<E>>) -> Self {
        let state = QueryState::new(Arc::clone(&handler));
        Self {
            handler,
            state,
            error: None,
        }
    }

    pub fn handler(&self) -> &Arc<ConnectionHandler<E>> {
        &self.handler
    }

    /// The statement accumulated so far.
    pub fn state(&self) -> &QueryState<E> {
        &self.state
    }

    /// The first setter error since the last terminal call.
    pub fn error(&self) -> Option<&ChainError> {
        self.error.as_ref()
    }

    /// Drop the accumulated statement and any pending error.
    pub fn reset(&mut self) -> &mut Self {
        self.take();
        self
    }

    fn apply<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut QueryState<E>) -> ChainResult<&mut QueryState<E>>,
    {
        if self.error.is_none() {
            if let Err(err) = f(&mut self.state) {
                self.error = Some(err);
            }
        }
        self
    }

    /// Hand out the current state and error, leaving a fresh statement behind.
    fn take(&mut self) -> (QueryState<E>, Option<ChainError>) {
        let fresh = QueryState::new(Arc::clone(&self.handler));
        let state = std::mem::replace(&mut self.state, fresh);
        (state, self.error.take())
    }

    fn take_checked(&mut self) -> ChainResult<QueryState<E>> {
        match self.take() {
            (_, Some(err)) => Err(err),
            (state, None) => Ok(state),
        }
    }

    // ==================== Setters ====================

    pub fn select(&mut self, columns: impl IntoColumns) -> &mut Self {
        self.apply(|q| q.select(columns))
    }

    pub fn select_per_table<I, T, C>(&mut self, tables: I) -> &mut Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: AsRef<str>,
        C: IntoColumns,
    {
        self.apply(|q| q.select_per_table(tables))
    }

    pub fn select_aggregate(
        &mut self,
        func: AggregateFn,
        column: Option<&str>,
        distinct: bool,
    ) -> &mut Self {
        self.apply(|q| q.select_aggregate(func, column, distinct))
    }

    pub fn select_clause(&mut self, clause: SelectClause) -> &mut Self {
        self.apply(|q| q.select_clause(clause))
    }

    pub fn from(&mut self, table: &str) -> &mut Self {
        self.apply(|q| q.from(table))
    }

    pub fn where_(&mut self, column: &str, operator: &str, value: impl Into<Literal>) -> &mut Self {
        self.apply(|q| q.where_(column, operator, value))
    }

    pub fn and_where(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Literal>,
    ) -> &mut Self {
        self.apply(|q| q.and_where(column, operator, value))
    }

    pub fn or_where(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Literal>,
    ) -> &mut Self {
        self.apply(|q| q.or_where(column, operator, value))
    }

    pub fn join<I, L, R>(&mut self, kind: &str, table: &str, on: I) -> &mut Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.apply(|q| q.join(kind, table, on))
    }

    pub fn join_kind<I, L, R>(&mut self, kind: JoinKind, table: &str, on: I) -> &mut Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.apply(|q| q.join_kind(kind, table, on))
    }

    pub fn inner_join<I, L, R>(&mut self, table: &str, on: I) -> &mut Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::Inner, table, on)
    }

    pub fn left_join<I, L, R>(&mut self, table: &str, on: I) -> &mut Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::Left, table, on)
    }

    pub fn right_join<I, L, R>(&mut self, table: &str, on: I) -> &mut Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::Right, table, on)
    }

    pub fn left_outer_join<I, L, R>(&mut self, table: &str, on: I) -> &mut Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::LeftOuter, table, on)
    }

    pub fn right_outer_join<I, L, R>(&mut self, table: &str, on: I) -> &mut Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::RightOuter, table, on)
    }

    pub fn full_outer_join<I, L, R>(&mut self, table: &str, on: I) -> &mut Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::FullOuter, table, on)
    }

    pub fn order_by(&mut self, columns: impl IntoColumns, direction: &str) -> &mut Self {
        self.apply(|q| q.order_by(columns, direction))
    }

    pub fn group_by(&mut self, columns: impl IntoColumns) -> &mut Self {
        self.apply(|q| q.group_by(columns))
    }

    pub fn group_concat(&mut self, column: &str, alias: Option<&str>, distinct: bool) -> &mut Self {
        self.apply(|q| q.group_concat(column, alias, distinct))
    }

    pub fn limit(&mut self, count: u64) -> &mut Self {
        self.apply(|q| q.limit(count))
    }

    pub fn limit_offset(&mut self, offset: u64, count: u64) -> &mut Self {
        self.apply(|q| q.limit_offset(offset, count))
    }

    pub fn insert_into(&mut self, table: &str) -> &mut Self {
        self.apply(|q| q.insert_into(table))
    }

    pub fn values<I, K, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Literal>,
    {
        self.apply(|q| q.values(values))
    }

    pub fn update(&mut self, table: &str) -> &mut Self {
        self.apply(|q| q.update(table))
    }

    pub fn set<I, K, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Literal>,
    {
        self.apply(|q| q.set(values))
    }

    pub fn delete_from(&mut self, table: &str) -> &mut Self {
        self.apply(|q| q.delete_from(table))
    }

    pub fn create_table<I, K, V>(&mut self, table: &str, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.apply(|q| q.create_table(table, columns))
    }

    pub fn drop_table(&mut self, table: &str) -> &mut Self {
        self.apply(|q| q.drop_table(table))
    }

    pub fn truncate_table(&mut self, table: &str) -> &mut Self {
        self.apply(|q| q.truncate_table(table))
    }

    // ==================== Inspection ====================

    /// Render without executing or resetting.
    pub fn render(&self) -> ChainResult<RenderedQuery> {
        match &self.error {
            Some(err) => Err(replay(err)),
            None => self.state.render(),
        }
    }

    pub fn to_sql(&self) -> ChainResult<String> {
        Ok(self.render()?.sql)
    }

    // ==================== Terminal calls ====================

    pub fn exec(&mut self) -> ChainResult<Outcome> {
        self.take_checked()?.exec()
    }

    pub fn find(&mut self, id: impl Into<Literal>) -> ChainResult<Option<Row>> {
        self.take_checked()?.find(id)
    }

    pub fn row(&mut self) -> ChainResult<Option<Row>> {
        self.take_checked()?.row()
    }

    pub fn find_all(&mut self) -> ChainResult<Option<Vec<Row>>> {
        self.take_checked()?.find_all()
    }

    pub fn count(&mut self) -> ChainResult<i64> {
        self.take_checked()?.count()
    }

    pub fn paginate(&mut self, page: u64, per_page: u64) -> ChainResult<Option<Vec<Row>>> {
        self.take_checked()?.paginate(page, per_page)
    }

    /// [`row`](Self::row), decoded into `T`.
    pub fn row_as<T: FromRow>(&mut self) -> ChainResult<Option<T>> {
        self.row()?.as_ref().map(T::from_row).transpose()
    }

    /// [`find_all`](Self::find_all), decoded into `T`. Empty results give an empty `Vec`.
    pub fn find_all_as<T: FromRow>(&mut self) -> ChainResult<Vec<T>> {
        self.find_all()?
            .unwrap_or_default()
            .iter()
            .map(T::from_row)
            .collect()
    }
}

/// A copy of a pending setter error for non-consuming calls.
fn replay(err: &ChainError) -> ChainError {
    match err {
        ChainError::InvalidArgument(message) => ChainError::invalid_argument(message.clone()),
        ChainError::Statement(message) => ChainError::statement(message.clone()),
        other => ChainError::invalid_argument(other.to_string()),
    }
}

impl<E> std::fmt::Debug for Builder<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("state", &self.state)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
