//! Map-based table access, for tables without a record type.
//!
//! ```ignore
//! let mut set = BTreeMap::new();
//! set.insert("price".to_string(), Expr::new("price * ? + ?", args![2, 100]).into());
//! db.table("goods").and_where("id = ?", [1]).update(set).await?;
//! ```

use std::collections::BTreeMap;

use crate::builder::{Assignment, FilterSpec};
use crate::db::Db;
use crate::error::{OrmError, OrmResult};
use crate::value::{ColumnValue, Value};

pub struct Table<'a> {
    db: &'a Db,
    name: String,
    filter: FilterSpec,
}

impl<'a> Table<'a> {
    pub(crate) fn new(db: &'a Db, name: &str) -> Self {
        Self {
            db,
            name: name.to_string(),
            filter: FilterSpec::new(),
        }
    }

    /// Add a WHERE fragment with `?` placeholders.
    pub fn and_where<I, T>(mut self, fragment: &str, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.filter.and_where(fragment, args);
        self
    }

    /// Insert one row. Returns the generated id, or 0.
    pub async fn create(self, values: BTreeMap<String, Value>) -> OrmResult<i64> {
        if values.is_empty() {
            return Err(OrmError::validation(format!(
                "nothing to insert into {}",
                self.name
            )));
        }
        let stmt = self.db.statements(&self.name).insert(&values);
        let result = self.db.exec_statement(stmt).await?;
        Ok(result.last_insert_id.unwrap_or(0))
    }

    /// Returns the affected row count.
    pub async fn update(self, set: BTreeMap<String, Assignment>) -> OrmResult<u64> {
        if set.is_empty() {
            return Err(OrmError::validation(format!(
                "nothing to update in {}",
                self.name
            )));
        }
        let stmt = self.db.statements(&self.name).update(&self.filter, &set);
        Ok(self.db.exec_statement(stmt).await?.rows_affected)
    }

    /// Requires at least one WHERE fragment.
    pub async fn delete(self) -> OrmResult<u64> {
        if !self.filter.has_where() {
            return Err(OrmError::validation(format!(
                "refusing to delete from {} without a WHERE clause",
                self.name
            )));
        }
        let stmt = self.db.statements(&self.name).delete(&self.filter);
        Ok(self.db.exec_statement(stmt).await?.rows_affected)
    }

    pub async fn count(self) -> OrmResult<i64> {
        let stmt = self.db.statements(&self.name).count(&self.filter);
        let value = self
            .db
            .query_statement(stmt)
            .await?
            .into_iter()
            .next()
            .and_then(|row| row.get_index(0).cloned())
            .ok_or_else(|| OrmError::not_found("count returned no rows"))?;
        i64::from_value(value).map_err(|e| OrmError::decode("count(*)", e))
    }
}
