//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use relorm::dialect::MySql;
use relorm::{Context, Db, ExecResult, Executor, OrmError, OrmResult, Record, Row, Value};

/// One call seen by [`ScriptedExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub args: Vec<Value>,
}

#[derive(Default)]
struct State {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<Vec<(String, Vec<Row>)>>,
    last_insert_id: Mutex<Option<i64>>,
    fail_on: Mutex<Option<String>>,
}

/// Records every statement and answers queries from a script.
///
/// Transactions are recorded as `BEGIN`, `COMMIT` and `ROLLBACK` calls on
/// the same log.
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    state: Arc<State>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries containing `pattern` with `rows`. First match wins.
    pub fn reply(&self, pattern: &str, rows: Vec<Row>) -> &Self {
        self.state
            .replies
            .lock()
            .unwrap()
            .push((pattern.to_string(), rows));
        self
    }

    pub fn set_last_insert_id(&self, id: i64) -> &Self {
        *self.state.last_insert_id.lock().unwrap() = Some(id);
        self
    }

    /// Fail every statement containing `pattern`.
    pub fn fail_on(&self, pattern: &str) -> &Self {
        *self.state.fail_on.lock().unwrap() = Some(pattern.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn sqls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.sql).collect()
    }

    /// Number of statements that start with `SELECT`.
    pub fn select_count(&self) -> usize {
        self.sqls().iter().filter(|s| s.starts_with("SELECT")).count()
    }

    pub fn db(&self) -> Db {
        Db::from_parts(Arc::new(self.clone()), Arc::new(MySql))
    }

    fn record(&self, sql: &str, args: &[Value]) -> OrmResult<()> {
        self.state.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        match self.state.fail_on.lock().unwrap().as_deref() {
            Some(pattern) if sql.contains(pattern) => {
                Err(OrmError::Query(format!("scripted failure: {sql}")))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn exec(&self, _ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.record(sql, args)?;
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: *self.state.last_insert_id.lock().unwrap(),
        })
    }

    async fn query(&self, _ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        self.record(sql, args)?;
        let replies = self.state.replies.lock().unwrap();
        Ok(replies
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn begin(&self, _ctx: &Context) -> OrmResult<Arc<dyn Executor>> {
        self.record("BEGIN", &[])?;
        Ok(Arc::new(self.clone()))
    }

    async fn commit(&self, _ctx: &Context) -> OrmResult<()> {
        self.record("COMMIT", &[])
    }

    async fn rollback(&self, _ctx: &Context) -> OrmResult<()> {
        self.record("ROLLBACK", &[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Record)]
#[orm(table = "users")]
pub struct User {
    #[orm(id)]
    pub id: i64,
    pub name: String,
    pub status: i32,
    pub created_at: Option<chrono::NaiveDateTime>,
    pub updated_at: Option<chrono::NaiveDateTime>,
}

pub fn user_row(id: i64, name: &str, status: i32) -> Row {
    Row::new()
        .with("id", id)
        .with("name", name)
        .with("status", status)
}

/// Assert a table has the expected name and primary key.
pub fn assert_table<R: Record>(table: &str, pk: &str) {
    assert_eq!(R::table_name(), table);
    assert_eq!(R::primary_key(), pk);
}
