use std::collections::BTreeMap;

use super::filter::FilterSpec;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// SQL text plus positional arguments, ready for an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// Raw SQL expression for an UPDATE assignment, e.g. `price * ? + ?`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Expr {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// Right-hand side of a `SET col = ...` assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Value(Value),
    Expr(Expr),
}

impl Assignment {
    pub fn value(v: impl Into<Value>) -> Self {
        Assignment::Value(v.into())
    }
}

impl From<Value> for Assignment {
    fn from(v: Value) -> Self {
        Assignment::Value(v)
    }
}

impl From<Expr> for Assignment {
    fn from(e: Expr) -> Self {
        Assignment::Expr(e)
    }
}

/// Renders statements for one table in one dialect.
///
/// Pure string assembly: never fails, never validates fragments.
pub struct StatementBuilder<'a> {
    dialect: &'a dyn Dialect,
    table: &'a str,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(dialect: &'a dyn Dialect, table: &'a str) -> Self {
        Self { dialect, table }
    }

    /// `schema.table` quotes each part separately.
    fn quoted_table(&self) -> String {
        self.table
            .split('.')
            .map(|part| self.dialect.quote(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// `{hint}SELECT {fields} FROM t [force index(..)] [WHERE ..] [ORDER BY ..] [LIMIT ..] [OFFSET ..];`
    pub fn select(&self, filter: &FilterSpec) -> Statement {
        let mut parts = vec![
            format!("{}SELECT {}", filter.hint_prefix(), filter.fields()),
            format!("FROM {}", self.quoted_table()),
        ];
        parts.extend(filter.force_index_clause());
        parts.push(filter.where_clause());
        parts.extend(filter.order_clause());
        parts.extend(filter.limit_clause());
        parts.extend(filter.offset_clause());
        Statement::new(finish(parts), filter.params().to_vec())
    }

    /// `SELECT count(*) FROM t [WHERE ..] [LIMIT ..] [OFFSET ..];`
    pub fn count(&self, filter: &FilterSpec) -> Statement {
        let mut parts = vec![format!("SELECT count(*) FROM {}", self.quoted_table())];
        parts.push(filter.where_clause());
        parts.extend(filter.limit_clause());
        parts.extend(filter.offset_clause());
        Statement::new(finish(parts), filter.params().to_vec())
    }

    /// Columns in lexicographic order, one placeholder each.
    pub fn insert(&self, values: &BTreeMap<String, Value>) -> Statement {
        let cols: Vec<String> = values.keys().map(|k| self.dialect.quote(k)).collect();
        let marks = vec!["?"; values.len()];
        let sql = format!(
            "INSERT INTO {} ({}) VALUES({});",
            self.quoted_table(),
            cols.join(","),
            marks.join(",")
        );
        Statement::new(sql, values.values().cloned().collect())
    }

    /// SET columns in lexicographic order; SET args precede WHERE args.
    pub fn update(&self, filter: &FilterSpec, set: &BTreeMap<String, Assignment>) -> Statement {
        let mut args = Vec::with_capacity(set.len() + filter.params().len());
        let mut assignments = Vec::with_capacity(set.len());
        for (col, assignment) in set {
            match assignment {
                Assignment::Value(v) => {
                    assignments.push(format!("{}=?", self.dialect.quote(col)));
                    args.push(v.clone());
                }
                Assignment::Expr(e) => {
                    assignments.push(format!("{}={}", self.dialect.quote(col), e.sql));
                    args.extend(e.args.iter().cloned());
                }
            }
        }
        args.extend(filter.params().iter().cloned());

        let parts = vec![
            format!(
                "UPDATE {} SET {}",
                self.quoted_table(),
                assignments.join(",")
            ),
            filter.where_clause(),
        ];
        Statement::new(finish(parts), args)
    }

    /// `DELETE FROM t [WHERE ..];`
    pub fn delete(&self, filter: &FilterSpec) -> Statement {
        let parts = vec![
            format!("DELETE FROM {}", self.quoted_table()),
            filter.where_clause(),
        ];
        Statement::new(finish(parts), filter.params().to_vec())
    }
}

fn finish(parts: Vec<String>) -> String {
    let mut sql = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    sql.truncate(sql.trim_end().len());
    sql.push(';');
    sql
}

/// Expand `?` placeholders bound to [`Value::List`] into `?, ?, ...`.
///
/// Statements without list arguments are returned unchanged. Placeholders
/// inside quoted literals or identifiers are not counted.
pub fn expand_list_args(sql: &str, args: Vec<Value>) -> OrmResult<(String, Vec<Value>)> {
    if !args.iter().any(|a| matches!(a, Value::List(_))) {
        return Ok((sql.to_string(), args));
    }

    let mut out = String::with_capacity(sql.len() + args.len() * 3);
    let mut expanded = Vec::with_capacity(args.len());
    let mut args = args.into_iter();
    let mut quote: Option<char> = None;

    for ch in sql.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
                out.push(ch);
            }
            None if matches!(ch, '\'' | '"' | '`') => {
                quote = Some(ch);
                out.push(ch);
            }
            None if ch == '?' => {
                let arg = args.next().ok_or_else(|| {
                    OrmError::validation("number of placeholders exceeds arguments")
                })?;
                match arg {
                    Value::List(items) => {
                        if items.is_empty() {
                            return Err(OrmError::validation(
                                "empty list bound to an IN placeholder",
                            ));
                        }
                        out.push_str(&vec!["?"; items.len()].join(", "));
                        expanded.extend(items);
                    }
                    other => {
                        out.push('?');
                        expanded.push(other);
                    }
                }
            }
            None => out.push(ch),
        }
    }

    if args.next().is_some() {
        return Err(OrmError::validation("number of arguments exceeds placeholders"));
    }
    Ok((out, expanded))
}
