//! Per-statement query logging.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::Level;

use crate::value::Value;

/// What happened to one executed statement.
#[derive(Debug, Clone)]
pub struct QueryStatus {
    pub query: String,
    pub args: Vec<Value>,
    pub error: Option<String>,
    pub start: Instant,
    pub elapsed: Duration,
}

impl QueryStatus {
    /// Start timing a statement.
    pub fn start(query: &str, args: &[Value]) -> Self {
        Self {
            query: query.to_string(),
            args: args.to_vec(),
            error: None,
            start: Instant::now(),
            elapsed: Duration::ZERO,
        }
    }

    /// Stop the clock and record the outcome.
    pub fn finish<T, E: fmt::Display>(mut self, result: &Result<T, E>) -> Self {
        self.elapsed = self.start.elapsed();
        if let Err(e) = result {
            self.error = Some(e.to_string());
        }
        self
    }

    /// Emit on target `relorm.sql`.
    ///
    /// `INFO` with `show_sql`, `DEBUG` otherwise; failures always at `WARN`.
    pub fn log(&self, show_sql: bool) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let level = if self.error.is_some() {
            Level::WARN
        } else if show_sql {
            Level::INFO
        } else {
            Level::DEBUG
        };
        let sql = collapse_whitespace(&self.query);
        let elapsed_ms = self.elapsed.as_secs_f64() * 1000.0;
        match &self.error {
            Some(error) => emit_at_level!(
                level,
                target: "relorm.sql",
                sql = %sql,
                args = ?self.args,
                elapsed_ms,
                error = %error,
            ),
            None => emit_at_level!(
                level,
                target: "relorm.sql",
                sql = %sql,
                args = ?self.args,
                elapsed_ms,
            ),
        }
    }
}

fn collapse_whitespace(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query = collapse_whitespace(&self.query);
        if !query.is_empty() {
            writeln!(f, "Query: {query}")?;
        }
        if !self.args.is_empty() {
            writeln!(f, "Args:  {:?}", self.args)?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "Error: {error}")?;
        }
        write!(f, "Time:  {:.5}s", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_query_args_error_and_time() {
        let status = QueryStatus::start("SELECT *\n\tFROM t   WHERE (id = ?);", &[Value::Int(1)])
            .finish::<(), _>(&Err("boom"));
        let text = status.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Query: SELECT * FROM t WHERE (id = ?);");
        assert_eq!(lines[1], "Args:  [Int(1)]");
        assert_eq!(lines[2], "Error: boom");
        assert!(lines[3].starts_with("Time:  "));
    }

    #[test]
    fn display_omits_empty_args() {
        let status = QueryStatus::start("SELECT 1;", &[]).finish::<(), String>(&Ok(()));
        assert!(!status.to_string().contains("Args:"));
        assert!(status.error.is_none());
    }
}
