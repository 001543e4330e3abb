//! Record metadata: the compile-time description of a table-backed struct.
//!
//! A record exposes its table, primary key and a static list of [`Field`]
//! descriptors. Everything relorm does to a record goes through these
//! descriptors, so there is no runtime reflection. Usually the impl is
//! generated with `#[derive(Record)]`.

use chrono::{DateTime, Local};

use crate::error::OrmResult;
use crate::hook::HookSet;
use crate::relation::Relation;
use crate::row::Row;
use crate::value::Value;

/// Accessors for one persisted column of `R`.
pub struct Field<R> {
    pub column: &'static str,
    pub get: fn(&R) -> Value,
    pub set: fn(&mut R, Value) -> OrmResult<()>,
    pub is_zero: fn(&R) -> bool,
    /// Write the current time into the field. Returns `false` when the field
    /// type cannot hold a timestamp.
    pub touch: fn(&mut R, &DateTime<Local>) -> bool,
}

impl<R> Clone for Field<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Field<R> {}

impl<R> std::fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field").field("column", &self.column).finish()
    }
}

/// A struct mapped to a table row.
pub trait Record: Clone + Default + Send + Sync + 'static {
    /// Logical table name (unquoted).
    fn table_name() -> &'static str;

    /// Primary key column.
    fn primary_key() -> &'static str;

    /// Persisted columns. Relation fields are not listed here.
    fn fields() -> &'static [Field<Self>];

    /// Declared relations, resolved after reads.
    fn relations() -> Vec<Relation<Self>> {
        Vec::new()
    }

    /// Lifecycle hooks.
    fn hooks() -> HookSet<Self> {
        HookSet::new()
    }

    fn field(column: &str) -> Option<&'static Field<Self>> {
        Self::fields().iter().find(|f| f.column == column)
    }

    /// Write the columns present in `row` into this record. Fields the row
    /// does not carry, skipped fields and relation fields are left alone.
    fn apply_row(&mut self, row: &Row) -> OrmResult<()> {
        for field in Self::fields() {
            if let Some(value) = row.get(field.column) {
                (field.set)(self, value.clone())?;
            }
        }
        Ok(())
    }

    /// Build a record from a row. Columns missing from the row keep their
    /// default value; extra columns are ignored.
    fn from_row(row: &Row) -> OrmResult<Self> {
        let mut record = Self::default();
        record.apply_row(row)?;
        Ok(record)
    }
}
