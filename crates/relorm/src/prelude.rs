//! Convenient imports for typical `relorm` usage.
//!
//! ```ignore
//! use relorm::prelude::*;
//! ```

pub use crate::{
    Assignment, ColumnValue, Context, Db, Expr, FilterSpec, Hook, HookPoint, HookSet, OrmError,
    OrmResult, Record, Registry, Relation, Value, args,
};

#[cfg(feature = "postgres")]
pub use crate::PgExecutor;
