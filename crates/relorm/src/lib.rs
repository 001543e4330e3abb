//! # relorm
//!
//! A struct-first ORM: records describe their table, columns and relations
//! once, and relorm generates the SQL for routine CRUD.
//!
//! ## Features
//!
//! - **Deterministic SQL**: INSERT/UPDATE columns are always in lexicographic order
//! - **Partial updates**: zero-valued fields are skipped unless explicitly kept
//! - **Automatic timestamps**: `created_at`/`updated_at` style columns are filled when empty
//! - **Lifecycle hooks**: before/after create, update, delete and find
//! - **Batched relations**: one extra query per relation, not per record
//! - **Pluggable executor**: any connection, transaction or test double
//!
//! ## Example
//!
//! ```ignore
//! use relorm::prelude::*;
//!
//! #[derive(Debug, Clone, Default, Record)]
//! #[orm(table = "users")]
//! struct User {
//!     #[orm(id)]
//!     id: i64,
//!     name: String,
//!     status: i32,
//!     created_at: Option<chrono::NaiveDateTime>,
//!     #[orm(relation = "id,user_id")]
//!     posts: Vec<Post>,
//! }
//!
//! let mut user = User { name: "alice".into(), ..Default::default() };
//! db.model(&mut user).create().await?;
//!
//! let mut users = Vec::new();
//! db.models(&mut users).and_where("status = ?", [1]).all().await?;
//! ```

extern crate self as relorm;

pub mod builder;
pub mod config;
pub mod context;
pub mod db;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod hook;
pub mod log;
pub mod mapper;
pub mod model;
pub mod prelude;
pub mod record;
pub mod registry;
pub mod relation;
pub mod row;
pub mod table;
pub mod transaction;
pub mod value;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(test)]
mod test_support;

pub use builder::{Assignment, Expr, FilterSpec, Statement, StatementBuilder};
pub use config::Config;
pub use context::Context;
pub use db::Db;
pub use dialect::Dialect;
pub use error::{HookErrors, OrmError, OrmResult};
pub use executor::{ExecResult, Executor};
pub use hook::{Hook, HookPoint, HookSet};
pub use log::QueryStatus;
pub use model::{Model, Models};
pub use record::{Field, Record};
pub use registry::{Connection, Registry};
pub use relation::{Cardinality, Relation, RelationDescriptor};
pub use row::Row;
pub use table::Table;
pub use transaction::Tx;
pub use value::{ColumnValue, TIME_FORMAT, Value};

#[cfg(feature = "derive")]
pub use relorm_derive::Record;

#[cfg(feature = "postgres")]
pub use postgres::PgExecutor;

// Return type of database-aware hooks.
pub use futures_core::future::BoxFuture;

#[doc(hidden)]
pub mod __private {
    pub use chrono::{DateTime, Local};
}
