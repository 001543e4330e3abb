//! Shared fixtures for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime};

use crate::context::Context;
use crate::db::Db;
use crate::dialect::MySql;
use crate::error::{OrmError, OrmResult};
use crate::executor::{ExecResult, Executor};
use crate::record::{Field, Record};
use crate::row::Row;
use crate::value::{ColumnValue, Value};

/// Hand-written record, declared out of column order on purpose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub status: i32,
    pub email: String,
    pub created_at: String,
    pub updated_at: Option<NaiveDateTime>,
}

macro_rules! field {
    ($col:literal, $f:ident) => {
        Field {
            column: $col,
            get: |r: &User| r.$f.to_value(),
            set: |r: &mut User, v: Value| {
                r.$f = ColumnValue::from_value(v).map_err(|e| OrmError::decode($col, e))?;
                Ok(())
            },
            is_zero: |r: &User| r.$f.is_zero(),
            touch: |r: &mut User, now: &DateTime<Local>| match ColumnValue::now(now) {
                Some(v) => {
                    r.$f = v;
                    true
                }
                None => false,
            },
        }
    };
}

static USER_FIELDS: [Field<User>; 6] = [
    field!("id", id),
    field!("name", name),
    field!("status", status),
    field!("email", email),
    field!("created_at", created_at),
    field!("updated_at", updated_at),
];

impl Record for User {
    fn table_name() -> &'static str {
        "users"
    }

    fn primary_key() -> &'static str {
        "id"
    }

    fn fields() -> &'static [Field<Self>] {
        &USER_FIELDS
    }
}

/// Records every statement; answers queries with no rows.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub statements: Mutex<Vec<(String, Vec<Value>)>>,
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn exec(&self, _ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        })
    }

    async fn query(&self, _ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
        Ok(Vec::new())
    }
}

pub fn fake_db() -> Db {
    Db::new(RecordingExecutor::default(), MySql)
}
