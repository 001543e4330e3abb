//! The statement executor seam.
//!
//! relorm never talks to a driver directly. Everything goes through an
//! [`Executor`], which may be a plain connection, an open transaction or a
//! test double. Builders and the relation resolver work identically on any of
//! them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Generated key, for drivers that report one.
    pub last_insert_id: Option<i64>,
}

/// Runs SQL with positional `?` arguments.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute a statement that returns no rows.
    async fn exec(&self, ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<ExecResult>;

    /// Execute a query and return all rows.
    async fn query(&self, ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>>;

    /// Execute a query and return the **first** row.
    ///
    /// Returns `OrmError::NotFound` if no rows are returned.
    async fn query_one(&self, ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<Row> {
        self.query(ctx, sql, args)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OrmError::not_found("query returned no rows"))
    }

    /// Open a transaction and return the executor bound to it.
    ///
    /// The default implementation returns an error.
    async fn begin(&self, ctx: &Context) -> OrmResult<Arc<dyn Executor>> {
        let _ = ctx;
        Err(OrmError::Other(
            "begin() not supported by this executor".to_string(),
        ))
    }

    /// Commit the transaction this executor is bound to.
    async fn commit(&self, ctx: &Context) -> OrmResult<()> {
        let _ = ctx;
        Err(OrmError::Other(
            "commit() not supported by this executor".to_string(),
        ))
    }

    /// Roll back the transaction this executor is bound to.
    async fn rollback(&self, ctx: &Context) -> OrmResult<()> {
        let _ = ctx;
        Err(OrmError::Other(
            "rollback() not supported by this executor".to_string(),
        ))
    }
}
