//! Decoded result rows

use crate::error::{OrmError, OrmResult};
use crate::value::{ColumnValue, Value};

/// One result row: column names paired with decoded values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. A later column with the same name shadows nothing;
    /// lookups by name return the first match.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    /// Builder-style [`Row::push`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Decode a named column into `T`.
    pub fn try_get_column<T: ColumnValue>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| OrmError::decode(column, "column not present in row"))?;
        T::from_value(value.clone()).map_err(|e| OrmError::decode(column, e))
    }
}

impl<C: Into<String>, V: Into<Value>> FromIterator<(C, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (c, v) in iter {
            row.push(c, v);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_index() {
        let row = Row::new().with("id", 3).with("name", "bob");
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("name"), Some(&Value::Text("bob".into())));
        assert_eq!(row.get_index(0), Some(&Value::Int(3)));
        assert_eq!(row.try_get_column::<i32>("id").unwrap(), 3);
    }

    #[test]
    fn missing_column_is_decode_error() {
        let row = Row::new().with("id", 1);
        let err = row.try_get_column::<String>("email").unwrap_err();
        assert!(matches!(err, OrmError::Decode { ref column, .. } if column == "email"));
    }
}
