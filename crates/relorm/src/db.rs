//! The database handle.
//!
//! A [`Db`] is the current effective executor (a connection or an open
//! transaction) plus its dialect, context and an optional [`Registry`] for
//! routing to other named connections. It is cheap to clone.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::builder::{FilterSpec, Statement, StatementBuilder, expand_list_args};
use crate::context::Context;
use crate::dialect::Dialect;
use crate::error::{HookErrors, OrmError, OrmResult};
use crate::executor::{ExecResult, Executor};
use crate::hook::phase;
use crate::log::QueryStatus;
use crate::model::{Model, Models};
use crate::record::Record;
use crate::registry::Registry;
use crate::relation::{RelationChains, resolve_many, resolve_one};
use crate::row::Row;
use crate::table::Table;
use crate::value::Value;

#[derive(Clone)]
pub struct Db {
    executor: Arc<dyn Executor>,
    dialect: Arc<dyn Dialect>,
    registry: Option<Arc<Registry>>,
    ctx: Context,
    show_sql: bool,
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("dialect", &self.dialect.name())
            .field("show_sql", &self.show_sql)
            .field("has_registry", &self.registry.is_some())
            .finish()
    }
}

impl Db {
    pub fn new(executor: impl Executor + 'static, dialect: impl Dialect + 'static) -> Self {
        Self::from_parts(Arc::new(executor), Arc::new(dialect))
    }

    pub fn from_parts(executor: Arc<dyn Executor>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            executor,
            dialect,
            registry: None,
            ctx: Context::default(),
            show_sql: false,
        }
    }

    pub(crate) fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Log every statement at `INFO` instead of `DEBUG`.
    pub fn show_sql(mut self, on: bool) -> Self {
        self.show_sql = on;
        self
    }

    /// A handle that passes `ctx` to the executor and context-aware hooks.
    pub fn with_context(&self, ctx: Context) -> Self {
        Self {
            ctx,
            ..self.clone()
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    pub fn registry(&self) -> Option<&Arc<Registry>> {
        self.registry.as_ref()
    }

    /// Same handle bound to another executor (e.g. an open transaction).
    pub(crate) fn rebind(&self, executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            ..self.clone()
        }
    }

    /// Switch to a named connection of the registry, keeping this context.
    pub fn use_db(&self, name: &str) -> OrmResult<Db> {
        let registry = self.registry.as_ref().ok_or_else(|| {
            OrmError::config(format!(
                "connection `{name}` requested but this handle has no registry"
            ))
        })?;
        Ok(registry.use_db(name)?.with_context(self.ctx.clone()))
    }

    /// `None` keeps this handle; `Some(name)` switches connection.
    pub(crate) fn route(&self, connection: Option<&str>) -> OrmResult<Db> {
        match connection {
            None => Ok(self.clone()),
            Some(name) => self.use_db(name),
        }
    }

    // ── builders ───────────────────────────────────────────────────────────

    /// CRUD builder for a single record.
    pub fn model<'a, R: Record>(&'a self, record: &'a mut R) -> Model<'a, R> {
        Model::new(self, record)
    }

    /// Read builder for a list of records.
    pub fn models<'a, R: Record>(&'a self, records: &'a mut Vec<R>) -> Models<'a, R> {
        Models::new(self, records)
    }

    /// Map-based builder for a table without a record type.
    pub fn table(&self, name: &str) -> Table<'_> {
        Table::new(self, name)
    }

    pub(crate) fn statements<'a>(&'a self, table: &'a str) -> StatementBuilder<'a> {
        StatementBuilder::new(self.dialect.as_ref(), table)
    }

    // ── raw statements ─────────────────────────────────────────────────────

    /// Execute a write statement. `Value::List` arguments expand `IN (?)`.
    pub async fn exec(&self, sql: &str, args: Vec<Value>) -> OrmResult<ExecResult> {
        self.exec_statement(Statement::new(sql, args)).await
    }

    /// Run a query and return every row.
    pub async fn query(&self, sql: &str, args: Vec<Value>) -> OrmResult<Vec<Row>> {
        self.query_statement(Statement::new(sql, args)).await
    }

    /// Run a query and return the first row, or `NotFound`.
    pub async fn query_one(&self, sql: &str, args: Vec<Value>) -> OrmResult<Row> {
        self.query(sql, args)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OrmError::not_found("query returned no rows"))
    }

    /// Load one record from raw SQL, resolving its relations.
    ///
    /// `BeforeFind` runs on a default record before the query; the row is
    /// then applied to that same record.
    pub async fn get<R: Record>(&self, sql: &str, args: Vec<Value>) -> OrmResult<R> {
        let hooks = R::hooks();
        let mut record = R::default();
        hooks
            .run_phase(phase::BEFORE_FIND, &mut record, self)
            .await?;

        let row = self.query_one(sql, args).await?;
        record.apply_row(&row)?;
        resolve_one(self, &mut record, &RelationChains::new()).await?;
        hooks
            .run_phase(phase::AFTER_FIND, &mut record, self)
            .await?;
        Ok(record)
    }

    /// Load records from raw SQL, resolving relations in batch.
    pub async fn select<R: Record>(&self, sql: &str, args: Vec<Value>) -> OrmResult<Vec<R>> {
        let rows = self.query(sql, args).await?;
        let mut records = rows
            .iter()
            .map(R::from_row)
            .collect::<OrmResult<Vec<R>>>()?;
        resolve_many(self, &mut records, &RelationChains::new()).await?;
        self.after_find_all(&mut records).await?;
        Ok(records)
    }

    pub(crate) async fn after_find_all<R: Record>(&self, records: &mut [R]) -> OrmResult<()> {
        let hooks = R::hooks();
        if hooks.is_empty() {
            return Ok(());
        }
        let mut errors = HookErrors::new();
        for record in records.iter_mut() {
            for point in phase::AFTER_FIND {
                errors.extend(hooks.dispatch(*point, record, self).await);
            }
        }
        errors.into_result()
    }

    /// Execute every `;`-separated statement in an SQL file.
    ///
    /// The file is split on every `;`, including one inside a string literal
    /// or comment, so such files must be run statement by statement instead.
    pub async fn import(&self, path: impl AsRef<Path>) -> OrmResult<Vec<ExecResult>> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let mut results = Vec::new();
        for sql in text.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            results.push(self.exec(sql, Vec::new()).await?);
        }
        Ok(results)
    }

    // ── execution ──────────────────────────────────────────────────────────

    pub(crate) async fn exec_statement(&self, stmt: Statement) -> OrmResult<ExecResult> {
        let (sql, args) = expand_list_args(&stmt.sql, stmt.args)?;
        self.ctx.check()?;
        let status = QueryStatus::start(&sql, &args);
        let result = self.executor.exec(&self.ctx, &sql, &args).await;
        status.finish(&result).log(self.show_sql);
        result
    }

    pub(crate) async fn query_statement(&self, stmt: Statement) -> OrmResult<Vec<Row>> {
        let (sql, args) = expand_list_args(&stmt.sql, stmt.args)?;
        self.ctx.check()?;
        let status = QueryStatus::start(&sql, &args);
        let result = self.executor.query(&self.ctx, &sql, &args).await;
        status.finish(&result).log(self.show_sql);
        result
    }

    /// Plain `SELECT` into records: no hooks, no relation resolution.
    pub(crate) async fn fetch_records<T: Record>(
        &self,
        table: &str,
        filter: &FilterSpec,
    ) -> OrmResult<Vec<T>> {
        let stmt = self.statements(table).select(filter);
        self.query_statement(stmt)
            .await?
            .iter()
            .map(T::from_row)
            .collect()
    }
}
