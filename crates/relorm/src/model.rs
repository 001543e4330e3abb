//! Record-driven CRUD builders.
//!
//! ```ignore
//! let mut user = User { id: 1, ..Default::default() };
//! db.model(&mut user).get().await?;
//!
//! user.status = 0;
//! db.model(&mut user).update(&["status"]).await?;
//!
//! let mut users = Vec::new();
//! db.models(&mut users)
//!     .and_where("status = ?", [1])
//!     .order_by("id desc")
//!     .limit(10)
//!     .all()
//!     .await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Local;

use crate::builder::{Assignment, FilterSpec};
use crate::db::Db;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::hook::phase;
use crate::mapper::{
    AUTO_CREATE_TIME_FIELDS, AUTO_UPDATE_TIME_FIELDS, FieldMap, fill_primary_key, map_fields,
    struct_auto_time, zero_value_filter,
};
use crate::record::Record;
use crate::relation::{RelationChains, resolve_many, resolve_one};
use crate::row::Row;
use crate::value::{ColumnValue, Value};

/// Setters shared by [`Model`] and [`Models`]. `and_where` accumulates, the
/// others overwrite.
macro_rules! filter_setters {
    () => {
        /// Add a WHERE fragment with `?` placeholders.
        pub fn and_where<I, T>(mut self, fragment: &str, args: I) -> Self
        where
            I: IntoIterator<Item = T>,
            T: Into<Value>,
        {
            self.filter.and_where(fragment, args);
            self
        }

        pub fn order_by(mut self, order: &str) -> Self {
            self.filter.order_by(order);
            self
        }

        pub fn limit(mut self, limit: u64) -> Self {
            self.filter.limit(limit);
            self
        }

        pub fn offset(mut self, offset: u64) -> Self {
            self.filter.offset(offset);
            self
        }

        /// Raw SELECT list.
        pub fn select(mut self, fields: &str) -> Self {
            self.filter.select(fields);
            self
        }

        pub fn hint(mut self, hint: &str) -> Self {
            self.filter.hint(hint);
            self
        }

        pub fn force_index(mut self, index: &str) -> Self {
            self.filter.force_index(index);
            self
        }

        /// Use `table` instead of the record's own table name.
        pub fn table(mut self, table: &str) -> Self {
            self.table = Some(table.to_string());
            self
        }

        /// Narrow the secondary query of relation field `field`.
        pub fn relation<F>(mut self, field: &str, chain: F) -> Self
        where
            F: Fn(&mut FilterSpec) + Send + Sync + 'static,
        {
            self.chains.insert(field.to_string(), Arc::new(chain));
            self
        }

        fn table_name(&self) -> &str {
            self.table.as_deref().unwrap_or(R::table_name())
        }
    };
}

/// Append `` `col`=? `` for every entry, in column order.
fn where_by_example(dialect: &dyn Dialect, filter: &mut FilterSpec, values: FieldMap) {
    for (column, value) in values {
        filter.and_where(&format!("{}=?", dialect.quote(&column)), [value]);
    }
}

fn count_from_rows(rows: Vec<Row>) -> OrmResult<i64> {
    let value = rows
        .into_iter()
        .next()
        .and_then(|row| row.get_index(0).cloned())
        .ok_or_else(|| OrmError::not_found("count returned no rows"))?;
    i64::from_value(value).map_err(|e| OrmError::decode("count(*)", e))
}

/// CRUD builder over one record.
pub struct Model<'a, R: Record> {
    db: &'a Db,
    record: &'a mut R,
    filter: FilterSpec,
    table: Option<String>,
    chains: RelationChains,
}

impl<'a, R: Record> Model<'a, R> {
    pub(crate) fn new(db: &'a Db, record: &'a mut R) -> Self {
        Self {
            db,
            record,
            filter: FilterSpec::new(),
            table: None,
            chains: RelationChains::new(),
        }
    }

    filter_setters!();

    /// Load one row into the record.
    ///
    /// Non-zero fields of the record are added as equality filters. Fails
    /// with `NotFound` when nothing matches. Only the columns the row carries
    /// are written; relation fields are replaced by the resolved values.
    pub async fn get(mut self) -> OrmResult<()> {
        let db = self.db;
        let hooks = R::hooks();
        hooks
            .run_phase(phase::BEFORE_FIND, self.record, db)
            .await?;

        let example = zero_value_filter(self.record, &[]);
        where_by_example(db.dialect(), &mut self.filter, example);
        let stmt = db.statements(self.table_name()).select(&self.filter);
        let row = db
            .query_statement(stmt)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OrmError::not_found(format!("no row in {}", self.table_name())))?;

        self.record.apply_row(&row)?;
        resolve_one(db, self.record, &self.chains).await?;
        hooks.run_phase(phase::AFTER_FIND, self.record, db).await
    }

    /// Insert every column. A zero primary key is left to the database and
    /// filled from the generated id when the executor reports one.
    ///
    /// Returns the generated id, or 0.
    pub async fn create(self) -> OrmResult<i64> {
        let db = self.db;
        let hooks = R::hooks();
        hooks
            .run_phase(phase::BEFORE_CREATE, self.record, db)
            .await?;

        struct_auto_time(self.record, AUTO_CREATE_TIME_FIELDS, &Local::now());
        let mut values = map_fields(self.record);
        let pk = R::primary_key();
        if R::field(pk).is_some_and(|f| (f.is_zero)(&*self.record)) {
            values.remove(pk);
        }

        let stmt = db.statements(self.table_name()).insert(&values);
        let result = db.exec_statement(stmt).await?;
        if let Some(id) = result.last_insert_id {
            fill_primary_key(self.record, id)?;
        }

        hooks
            .run_phase(phase::AFTER_CREATE, self.record, db)
            .await?;
        Ok(result.last_insert_id.unwrap_or(0))
    }

    /// Update non-zero columns, plus the columns named in `keep`.
    ///
    /// Without a WHERE fragment the primary key becomes the filter and is
    /// dropped from the SET list. Returns the affected row count.
    pub async fn update(mut self, keep: &[&str]) -> OrmResult<u64> {
        let db = self.db;
        let hooks = R::hooks();
        hooks
            .run_phase(phase::BEFORE_UPDATE, self.record, db)
            .await?;

        struct_auto_time(self.record, AUTO_UPDATE_TIME_FIELDS, &Local::now());
        let mut values = zero_value_filter(self.record, keep);
        let pk = R::primary_key();
        if !self.filter.has_where()
            && let Some(id) = values.remove(pk)
        {
            self.filter
                .and_where(&format!("{}=?", db.dialect().quote(pk)), [id]);
        }
        if values.is_empty() {
            return Err(OrmError::validation(format!(
                "nothing to update in {}",
                self.table_name()
            )));
        }

        let set: BTreeMap<String, Assignment> = values
            .into_iter()
            .map(|(k, v)| (k, Assignment::Value(v)))
            .collect();
        let stmt = db.statements(self.table_name()).update(&self.filter, &set);
        let result = db.exec_statement(stmt).await?;

        hooks
            .run_phase(phase::AFTER_UPDATE, self.record, db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Delete rows matching the non-zero columns (plus `keep`) and any WHERE
    /// fragments. An empty filter is rejected.
    pub async fn delete(mut self, keep: &[&str]) -> OrmResult<u64> {
        let db = self.db;
        let hooks = R::hooks();
        hooks
            .run_phase(phase::BEFORE_DELETE, self.record, db)
            .await?;

        let example = zero_value_filter(self.record, keep);
        where_by_example(db.dialect(), &mut self.filter, example);
        if !self.filter.has_where() {
            return Err(OrmError::validation(format!(
                "refusing to delete from {} without a WHERE clause",
                self.table_name()
            )));
        }

        let stmt = db.statements(self.table_name()).delete(&self.filter);
        let result = db.exec_statement(stmt).await?;

        hooks
            .run_phase(phase::AFTER_DELETE, self.record, db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Count rows matching the non-zero columns (plus `keep`).
    pub async fn count(mut self, keep: &[&str]) -> OrmResult<i64> {
        let db = self.db;
        let example = zero_value_filter(self.record, keep);
        where_by_example(db.dialect(), &mut self.filter, example);
        let stmt = db.statements(self.table_name()).count(&self.filter);
        count_from_rows(db.query_statement(stmt).await?)
    }
}

/// Read builder over a list of records.
pub struct Models<'a, R: Record> {
    db: &'a Db,
    records: &'a mut Vec<R>,
    filter: FilterSpec,
    table: Option<String>,
    chains: RelationChains,
}

impl<'a, R: Record> Models<'a, R> {
    pub(crate) fn new(db: &'a Db, records: &'a mut Vec<R>) -> Self {
        Self {
            db,
            records,
            filter: FilterSpec::new(),
            table: None,
            chains: RelationChains::new(),
        }
    }

    filter_setters!();

    /// Replace the list with every matching row, relations resolved in
    /// batch.
    pub async fn all(self) -> OrmResult<()> {
        let db = self.db;
        let stmt = db.statements(self.table_name()).select(&self.filter);
        let mut loaded = db
            .query_statement(stmt)
            .await?
            .iter()
            .map(R::from_row)
            .collect::<OrmResult<Vec<R>>>()?;
        resolve_many(db, &mut loaded, &self.chains).await?;

        *self.records = loaded;
        db.after_find_all(self.records).await
    }

    /// Count rows matching the WHERE fragments.
    pub async fn count(self) -> OrmResult<i64> {
        let db = self.db;
        let stmt = db.statements(self.table_name()).count(&self.filter);
        count_from_rows(db.query_statement(stmt).await?)
    }
}
