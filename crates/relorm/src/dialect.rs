//! Identifier quoting per database family.

use std::fmt;
use std::sync::Arc;

/// Database-family specific SQL details.
pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Quote a single identifier.
    fn quote(&self, ident: &str) -> String;
}

/// MySQL / MariaDB: backtick quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

/// PostgreSQL: double-quote quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

/// SQLite: double-quote quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

/// Fallback used for unrecognized drivers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Common;

fn double_quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }
}

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote(&self, ident: &str) -> String {
        double_quote(ident)
    }
}

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite3"
    }

    fn quote(&self, ident: &str) -> String {
        double_quote(ident)
    }
}

impl Dialect for Common {
    fn name(&self) -> &'static str {
        "common"
    }

    fn quote(&self, ident: &str) -> String {
        double_quote(ident)
    }
}

/// Resolve a driver name. Unknown names fall back to [`Common`] with a
/// warning.
pub fn lookup(driver: &str) -> Arc<dyn Dialect> {
    match driver {
        "mysql" => Arc::new(MySql),
        "postgres" | "postgresql" | "pgx" => Arc::new(Postgres),
        "sqlite3" | "sqlite" => Arc::new(Sqlite),
        other => {
            tracing::warn!(
                target: "relorm",
                driver = other,
                "unsupported dialect, falling back to common quoting"
            );
            Arc::new(Common)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_per_family() {
        assert_eq!(MySql.quote("users"), "`users`");
        assert_eq!(Postgres.quote("users"), "\"users\"");
        assert_eq!(Sqlite.quote("users"), "\"users\"");
    }

    #[test]
    fn unknown_driver_falls_back() {
        let d = lookup("oracle");
        assert_eq!(d.name(), "common");
        assert_eq!(d.quote("t"), "\"t\"");
        assert_eq!(lookup("mysql").name(), "mysql");
        assert_eq!(lookup("postgres").name(), "postgres");
    }
}
