//! Field mapping: record -> column/value maps.
//!
//! Maps are `BTreeMap`s so iteration is always in lexicographic column order,
//! which is the order INSERT and UPDATE statements list their columns in.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use crate::error::{OrmError, OrmResult};
use crate::record::Record;
use crate::value::Value;

/// Columns filled with the current time on create when still zero.
pub const AUTO_CREATE_TIME_FIELDS: &[&str] = &[
    "create_time",
    "create_at",
    "created_at",
    "update_time",
    "update_at",
    "updated_at",
];

/// Columns filled with the current time on update when still zero.
pub const AUTO_UPDATE_TIME_FIELDS: &[&str] = &["update_time", "update_at", "updated_at"];

/// Column name to value, sorted by column.
pub type FieldMap = BTreeMap<String, Value>;

/// Every persisted column of `record`, zero or not.
pub fn map_fields<R: Record>(record: &R) -> FieldMap {
    R::fields()
        .iter()
        .map(|f| (f.column.to_string(), (f.get)(record)))
        .collect()
}

/// Columns whose value is non-zero, plus any column named in `keep`.
pub fn zero_value_filter<R: Record>(record: &R, keep: &[&str]) -> FieldMap {
    R::fields()
        .iter()
        .filter(|f| !(f.is_zero)(record) || keep.contains(&f.column))
        .map(|f| (f.column.to_string(), (f.get)(record)))
        .collect()
}

/// Set zero-valued timestamp columns named in `columns` to `now`.
///
/// Only fields that are currently zero are written. Returns the columns that
/// were touched.
pub fn struct_auto_time<R: Record>(
    record: &mut R,
    columns: &[&str],
    now: &DateTime<Local>,
) -> Vec<&'static str> {
    let mut touched = Vec::new();
    for field in R::fields() {
        if !columns.contains(&field.column) || !(field.is_zero)(record) {
            continue;
        }
        if (field.touch)(record, now) {
            touched.push(field.column);
        }
    }
    touched
}

/// Read one column by name.
pub fn column_value<R: Record>(record: &R, column: &str) -> Option<Value> {
    R::field(column).map(|f| (f.get)(record))
}

/// Write one column by name.
pub fn set_column<R: Record>(record: &mut R, column: &str, value: Value) -> OrmResult<()> {
    let field = R::field(column).ok_or_else(|| {
        OrmError::config(format!(
            "{} has no column named `{column}`",
            R::table_name()
        ))
    })?;
    (field.set)(record, value)
}

/// Store a database-generated id into a zero primary key.
///
/// Returns `true` when the key was written.
pub fn fill_primary_key<R: Record>(record: &mut R, id: i64) -> OrmResult<bool> {
    let Some(field) = R::field(R::primary_key()) else {
        return Ok(false);
    };
    if !(field.is_zero)(record) {
        return Ok(false);
    }
    (field.set)(record, Value::Int(id))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::User;
    use chrono::{NaiveDateTime, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn map_fields_is_sorted_and_complete() {
        let user = User::default();
        let keys: Vec<_> = map_fields(&user).into_keys().collect();
        assert_eq!(
            keys,
            vec!["created_at", "email", "id", "name", "status", "updated_at"]
        );
    }

    #[test]
    fn zero_filter_drops_zero_columns() {
        let user = User {
            id: 1,
            name: "alice".into(),
            ..Default::default()
        };
        let m = zero_value_filter(&user, &[]);
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn zero_filter_keeps_named_columns() {
        let user = User {
            id: 1,
            ..Default::default()
        };
        let m = zero_value_filter(&user, &["status", "not_a_column"]);
        assert_eq!(m.get("status"), Some(&Value::Int(0)));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn auto_time_fills_only_zero_fields() {
        let mut user = User::default();
        let touched = struct_auto_time(&mut user, AUTO_CREATE_TIME_FIELDS, &now());
        assert_eq!(touched, vec!["created_at", "updated_at"]);
        assert_eq!(user.created_at, "2024-01-02 03:04:05");
        assert_eq!(user.updated_at, Some(now().naive_local()));

        let preset = NaiveDateTime::parse_from_str("2000-01-01 00:00:00", crate::TIME_FORMAT)
            .unwrap();
        let mut user = User {
            created_at: "1999-12-31 23:59:59".into(),
            updated_at: Some(preset),
            ..Default::default()
        };
        assert!(struct_auto_time(&mut user, AUTO_CREATE_TIME_FIELDS, &now()).is_empty());
        assert_eq!(user.created_at, "1999-12-31 23:59:59");
        assert_eq!(user.updated_at, Some(preset));
    }

    #[test]
    fn auto_time_on_update_ignores_create_columns() {
        let mut user = User::default();
        let touched = struct_auto_time(&mut user, AUTO_UPDATE_TIME_FIELDS, &now());
        assert_eq!(touched, vec!["updated_at"]);
        assert!(user.created_at.is_empty());
    }

    #[test]
    fn primary_key_filled_only_when_zero() {
        let mut user = User::default();
        assert!(fill_primary_key(&mut user, 42).unwrap());
        assert_eq!(user.id, 42);
        assert!(!fill_primary_key(&mut user, 7).unwrap());
        assert_eq!(user.id, 42);
    }

    #[test]
    fn set_unknown_column_is_config_error() {
        let mut user = User::default();
        let err = set_column(&mut user, "nope", Value::Null).unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
        set_column(&mut user, "name", Value::from("x")).unwrap();
        assert_eq!(column_value(&user, "name"), Some(Value::from("x")));
    }
}
