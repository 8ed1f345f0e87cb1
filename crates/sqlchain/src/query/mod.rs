//! The per-statement accumulator.
//!
//! [`QueryState`] collects clauses for exactly one statement, renders it, and hands
//! the SQL plus bindings to its [`ConnectionHandler`]. Setters fail immediately on
//! malformed input; statement-level checks (missing table, UPDATE without WHERE,
//! ...) run when the statement is rendered.

mod where_group;


use crate::binding::{Bindings, KeyGen};
use crate::clause::{
    AggregateFn, Connector, GroupByClause, GroupConcatClause, IntoColumns, JoinClause, JoinKind,
    LimitClause, Operator, OrderByClause, SelectClause, SetClause, SortDirection,
    TableDefinition, ValuesClause, WhereClause,
};
use crate::error::{ChainError, ChainResult};
use crate::executor::{Executor, Outcome};
use crate::handler::ConnectionHandler;
use crate::ident::{RenderContext, resolve_table};
use crate::row::Row;
use crate::value::Literal;
use std::fmt;
use std::sync::Arc;
use where_group::render_where;

/// Statement operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Truncate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Select => "SELECT",
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Create => "CREATE TABLE",
            Operation::Drop => "DROP TABLE",
            Operation::Truncate => "TRUNCATE TABLE",
        })
    }
}

/// A rendered statement.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub operation: Operation,
    pub sql: String,
    /// Exactly the placeholders that occur in `sql`.
    pub bindings: Bindings,
}

/// Clause accumulator for one statement.
pub struct QueryState<E> {
    handler: Arc<ConnectionHandler<E>>,
    operation: Option<Operation>,
    table: Option<String>,
    select: Option<SelectClause>,
    wheres: Vec<WhereClause>,
    /// ANDed with the whole WHERE expression, whatever ORs it holds.
    required: Vec<WhereClause>,
    joins: Vec<JoinClause>,
    order_by: Option<OrderByClause>,
    group_by: Option<GroupByClause>,
    group_concat: Option<GroupConcatClause>,
    limit: Option<LimitClause>,
    values: Option<ValuesClause>,
    set: Option<SetClause>,
    definition: Option<TableDefinition>,
    keys: KeyGen,
}

impl<E: Executor> QueryState<E> {
    pub fn new(handler: Arc<ConnectionHandler<E>>) -> Self {
        Self {
            handler,
            operation: None,
            table: None,
            select: None,
            wheres: Vec::new(),
            required: Vec::new(),
            joins: Vec::new(),
            order_by: None,
            group_by: None,
            group_concat: None,
            limit: None,
            values: None,
            set: None,
            definition: None,
            keys: KeyGen::new(),
        }
    }

    pub fn handler(&self) -> &Arc<ConnectionHandler<E>> {
        &self.handler
    }

    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    /// The resolved (prefixed) target table.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    fn resolve(&self, table: &str) -> ChainResult<String> {
        resolve_table(table, &self.handler.config().table_prefix)
    }

    fn target(&mut self, operation: Operation, table: &str) -> ChainResult<&mut Self> {
        self.table = Some(self.resolve(table)?);
        self.operation = Some(operation);
        Ok(self)
    }

    // ==================== SELECT ====================

    /// `SELECT a, b, ...`
    pub fn select(&mut self, columns: impl IntoColumns) -> ChainResult<&mut Self> {
        self.select_clause(SelectClause::columns(columns)?)
    }

    /// `SELECT t1.a, t1.b, t2.c` from a per-table column map.
    pub fn select_per_table<I, T, C>(&mut self, tables: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (T, C)>,
        T: AsRef<str>,
        C: IntoColumns,
    {
        self.select_clause(SelectClause::per_table(tables)?)
    }

    /// `SELECT COUNT(...)` / `SELECT SUM(...)`
    pub fn select_aggregate(
        &mut self,
        func: AggregateFn,
        column: Option<&str>,
        distinct: bool,
    ) -> ChainResult<&mut Self> {
        self.select_clause(SelectClause::aggregate(func, column, distinct)?)
    }

    pub fn select_clause(&mut self, clause: SelectClause) -> ChainResult<&mut Self> {
        self.select = Some(clause);
        self.operation.get_or_insert(Operation::Select);
        Ok(self)
    }

    /// Set the base table. Implies SELECT when no operation has been chosen.
    pub fn from(&mut self, table: &str) -> ChainResult<&mut Self> {
        self.table = Some(self.resolve(table)?);
        self.operation.get_or_insert(Operation::Select);
        Ok(self)
    }

    // ==================== WHERE ====================

    fn push_where(
        &mut self,
        column: &str,
        operator: &str,
        value: Literal,
        connector: Connector,
    ) -> ChainResult<&mut Self> {
        let operator: Operator = operator.parse()?;
        let connector = if self.wheres.is_empty() {
            Connector::Plain
        } else {
            connector
        };
        let clause = WhereClause::new(column, operator, value, connector, &mut self.keys)?;
        self.wheres.push(clause);
        Ok(self)
    }

    /// First condition; after the first it behaves like [`and_where`](Self::and_where).
    pub fn where_(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Literal>,
    ) -> ChainResult<&mut Self> {
        self.push_where(column, operator, value.into(), Connector::And)
    }

    pub fn and_where(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Literal>,
    ) -> ChainResult<&mut Self> {
        self.push_where(column, operator, value.into(), Connector::And)
    }

    pub fn or_where(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Literal>,
    ) -> ChainResult<&mut Self> {
        self.push_where(column, operator, value.into(), Connector::Or)
    }

    pub fn has_where(&self) -> bool {
        !self.wheres.is_empty() || !self.required.is_empty()
    }

    // ==================== JOIN ====================

    /// `<kind> JOIN table ON ...`; `kind` is e.g. `"left outer"`.
    pub fn join<I, L, R>(&mut self, kind: &str, table: &str, on: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(kind.parse()?, table, on)
    }

    pub fn join_kind<I, L, R>(&mut self, kind: JoinKind, table: &str, on: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        let clause = JoinClause::new(kind, table, &self.handler.config().table_prefix, on)?;
        self.joins.push(clause);
        Ok(self)
    }

    pub fn inner_join<I, L, R>(&mut self, table: &str, on: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::Inner, table, on)
    }

    pub fn left_join<I, L, R>(&mut self, table: &str, on: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::Left, table, on)
    }

    pub fn right_join<I, L, R>(&mut self, table: &str, on: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::Right, table, on)
    }

    pub fn left_outer_join<I, L, R>(&mut self, table: &str, on: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::LeftOuter, table, on)
    }

    pub fn right_outer_join<I, L, R>(&mut self, table: &str, on: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::RightOuter, table, on)
    }

    pub fn full_outer_join<I, L, R>(&mut self, table: &str, on: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.join_kind(JoinKind::FullOuter, table, on)
    }

    // ==================== ORDER / GROUP / LIMIT ====================

    /// `ORDER BY columns direction`; `direction` is `"ASC"` or `"DESC"`.
    pub fn order_by(&mut self, columns: impl IntoColumns, direction: &str) -> ChainResult<&mut Self> {
        let direction: SortDirection = direction.parse()?;
        self.order_by = Some(OrderByClause::new(columns, direction)?);
        Ok(self)
    }

    pub fn group_by(&mut self, columns: impl IntoColumns) -> ChainResult<&mut Self> {
        self.group_by = Some(GroupByClause::new(columns)?);
        Ok(self)
    }

    pub fn group_concat(
        &mut self,
        column: &str,
        alias: Option<&str>,
        distinct: bool,
    ) -> ChainResult<&mut Self> {
        self.group_concat = Some(GroupConcatClause::new(column, alias, distinct)?);
        Ok(self)
    }

    pub fn limit(&mut self, count: u64) -> ChainResult<&mut Self> {
        self.limit = Some(LimitClause::new(count));
        Ok(self)
    }

    /// `LIMIT offset, count`
    pub fn limit_offset(&mut self, offset: u64, count: u64) -> ChainResult<&mut Self> {
        self.limit = Some(LimitClause::with_offset(offset, count));
        Ok(self)
    }

    // ==================== Writes ====================

    pub fn insert_into(&mut self, table: &str) -> ChainResult<&mut Self> {
        self.target(Operation::Insert, table)
    }

    /// Column -> value pairs for INSERT.
    pub fn values<I, K, V>(&mut self, values: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Literal>,
    {
        self.values = Some(ValuesClause::new(values, &mut self.keys)?);
        Ok(self)
    }

    pub fn update(&mut self, table: &str) -> ChainResult<&mut Self> {
        self.target(Operation::Update, table)
    }

    /// Column -> value pairs for UPDATE.
    pub fn set<I, K, V>(&mut self, values: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Literal>,
    {
        self.set = Some(SetClause::new(values, &mut self.keys)?);
        Ok(self)
    }

    pub fn delete_from(&mut self, table: &str) -> ChainResult<&mut Self> {
        self.target(Operation::Delete, table)
    }

    // ==================== DDL ====================

    /// `CREATE TABLE IF NOT EXISTS`; `columns` maps names to `"TYPE | MODIFIER"` specs.
    pub fn create_table<I, K, V>(&mut self, table: &str, columns: I) -> ChainResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let resolved = self.resolve(table)?;
        self.definition = Some(TableDefinition::new(resolved, columns)?);
        self.target(Operation::Create, table)
    }

    pub fn drop_table(&mut self, table: &str) -> ChainResult<&mut Self> {
        self.target(Operation::Drop, table)
    }

    pub fn truncate_table(&mut self, table: &str) -> ChainResult<&mut Self> {
        self.target(Operation::Truncate, table)
    }

    // ==================== Rendering ====================

    /// Render the statement without executing it.
    pub fn render(&self) -> ChainResult<RenderedQuery> {
        let operation = self
            .operation
            .ok_or_else(|| ChainError::statement("No operation set"))?;
        let table = self
            .table
            .as_deref()
            .ok_or_else(|| ChainError::statement("No table set"))?;
        let config = self.handler.config();
        let ctx = RenderContext::new(&config.table_prefix, table).qualify_bare(!self.joins.is_empty());

        if operation != Operation::Select && !self.joins.is_empty() {
            return Err(ChainError::statement(format!(
                "JOIN is only supported for SELECT, not {operation}"
            )));
        }

        let mut bindings = Bindings::new();
        let sql = match operation {
            Operation::Select => {
                let mut parts = Vec::new();
                let mut list = Vec::new();
                match &self.select {
                    Some(select) => list.push(select.render(&ctx)),
                    None if self.group_concat.is_none() => list.push("*".to_string()),
                    None => {}
                }
                if let Some(concat) = &self.group_concat {
                    list.push(concat.render(&ctx));
                }
                parts.push(format!("SELECT {} FROM {table}", list.join(", ")));
                parts.extend(self.joins.iter().map(|join| join.render(&ctx)));
                self.push_where_sql(&mut parts, &mut bindings, &ctx);
                if let Some(group) = &self.group_by {
                    parts.push(group.render(&ctx));
                }
                if let Some(order) = &self.order_by {
                    parts.push(order.render(&ctx));
                }
                if let Some(limit) = &self.limit {
                    parts.push(limit.render());
                }
                parts.join(" ")
            }
            Operation::Insert => {
                if self.has_where() {
                    return Err(ChainError::statement("INSERT does not take a WHERE clause"));
                }
                let values = self
                    .values
                    .as_ref()
                    .ok_or_else(|| ChainError::statement("INSERT requires VALUES"))?;
                bindings.extend(values.bindings().clone());
                format!("INSERT INTO {table} {}", values.render())
            }
            Operation::Update => {
                let set = self
                    .set
                    .as_ref()
                    .ok_or_else(|| ChainError::statement("UPDATE requires SET"))?;
                if !self.has_where() {
                    return Err(ChainError::statement(
                        "UPDATE without WHERE is refused; it would touch every row",
                    ));
                }
                bindings.extend(set.bindings().clone());
                let mut parts = vec![format!("UPDATE {table} {}", set.render())];
                self.push_where_sql(&mut parts, &mut bindings, &ctx);
                parts.join(" ")
            }
            Operation::Delete => {
                if !self.has_where() {
                    return Err(ChainError::statement(
                        "DELETE without WHERE is refused; use truncate_table to empty a table",
                    ));
                }
                let mut parts = vec![format!("DELETE FROM {table}")];
                self.push_where_sql(&mut parts, &mut bindings, &ctx);
                parts.join(" ")
            }
            Operation::Create => {
                let definition = self
                    .definition
                    .as_ref()
                    .ok_or_else(|| ChainError::statement("CREATE TABLE requires columns"))?;
                definition.render_create(config.dialect)
            }
            Operation::Drop => TableDefinition::named(table).render_drop(),
            Operation::Truncate => TableDefinition::named(table).render_truncate(config.dialect),
        };

        Ok(RenderedQuery {
            operation,
            sql,
            bindings,
        })
    }

    fn push_where_sql(&self, parts: &mut Vec<String>, bindings: &mut Bindings, ctx: &RenderContext<'_>) {
        let rendered = render_where(&self.wheres, &self.required, ctx);
        if rendered.is_empty() {
            return;
        }
        for clause in self.wheres.iter().chain(&self.required) {
            bindings.extend(clause.bindings().clone());
        }
        parts.push(rendered);
    }

    /// Rendered SQL with placeholders.
    pub fn to_sql(&self) -> ChainResult<String> {
        Ok(self.render()?.sql)
    }

    // ==================== Execution ====================

    /// Render and run the statement.
    ///
    /// Nothing reaches the handler if rendering fails.
    pub fn exec(&self) -> ChainResult<Outcome> {
        let rendered = self.render()?;
        let outcome = self.handler.query(&rendered.sql, Some(rendered.bindings))?;
        Ok(match rendered.operation {
            Operation::Create | Operation::Drop | Operation::Truncate => Outcome::Executed,
            _ => outcome,
        })
    }

    /// First row matching `id = <id>` within the existing conditions.
    ///
    /// The id filter is ANDed with the whole WHERE expression, so
    /// `where_(a).or_where(b).find(2)` renders `WHERE (a OR b) AND id = :id_1`.
    pub fn find(&mut self, id: impl Into<Literal>) -> ChainResult<Option<Row>> {
        let clause = WhereClause::new(
            "id",
            Operator::Eq,
            id.into(),
            Connector::And,
            &mut self.keys,
        )?;
        self.required.push(clause);
        self.row()
    }

    /// First matching row.
    pub fn row(&mut self) -> ChainResult<Option<Row>> {
        self.limit(1)?;
        Ok(self
            .exec()?
            .into_rows()
            .and_then(|rows| rows.into_iter().next()))
    }

    /// All matching rows; `None` when nothing matched.
    pub fn find_all(&self) -> ChainResult<Option<Vec<Row>>> {
        Ok(self.exec()?.into_rows())
    }

    /// `SELECT COUNT(*)` over the current FROM/JOIN/WHERE: the number of matching rows.
    ///
    /// GROUP BY, ORDER BY and LIMIT are dropped, so a grouped query still yields one total.
    pub fn count(&mut self) -> ChainResult<i64> {
        self.select = Some(SelectClause::aggregate(AggregateFn::Count, None, false)?);
        self.group_by = None;
        self.group_concat = None;
        self.order_by = None;
        self.limit = None;
        self.operation = Some(Operation::Select);
        let row = self.find_all()?.and_then(|rows| rows.into_iter().next());
        match row.as_ref().and_then(|r| r.values().first()) {
            Some(value) => i64::try_from(value.clone())
                .map_err(|e| ChainError::decode("COUNT(*)", e.to_string())),
            None => Ok(0),
        }
    }

    /// One page of results; `page` is 1-based and clamped to at least 1.
    pub fn paginate(&mut self, page: u64, per_page: u64) -> ChainResult<Option<Vec<Row>>> {
        let page = page.max(1);
        self.limit_offset((page - 1).saturating_mul(per_page), per_page)?;
        self.find_all()
    }
}

impl<E> fmt::Debug for QueryState<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryState")
            .field("operation", &self.operation)
            .field("table", &self.table)
            .field("select", &self.select)
            .field("wheres", &self.wheres)
            .field("required", &self.required)
            .field("joins", &self.joins)
            .field("order_by", &self.order_by)
            .field("group_by", &self.group_by)
            .field("group_concat", &self.group_concat)
            .field("limit", &self.limit)
            .field("values", &self.values)
            .field("set", &self.set)
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}
