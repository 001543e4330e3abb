//! Error types for relorm

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for relorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Misconfiguration: malformed relation tag, unknown hook point,
    /// unknown connection name.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Query execution error reported by an executor
    #[error("Query error: {0}")]
    Query(String),

    /// Error from the tokio-postgres driver
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// One or more lifecycle hooks failed
    #[error("Hook error: {0}")]
    Hook(HookErrors),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Context deadline exceeded
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// Context cancelled before the statement ran
    #[error("Query cancelled")]
    Cancelled,

    /// I/O error (e.g. reading an SQL file to import)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this is an aggregated hook error
    pub fn is_hook(&self) -> bool {
        matches!(self, Self::Hook(_))
    }
}

/// Errors reported by every hook of one phase, in invocation order.
#[derive(Debug, Default)]
pub struct HookErrors(Vec<OrmError>);

impl HookErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, err: OrmError) {
        self.0.push(err);
    }

    pub fn extend(&mut self, other: HookErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[OrmError] {
        &self.0
    }

    /// `Ok(())` when nothing failed, otherwise a single [`OrmError::Hook`].
    pub fn into_result(self) -> OrmResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(OrmError::Hook(self))
        }
    }
}

impl fmt::Display for HookErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_errors_join_messages() {
        let mut errs = HookErrors::new();
        errs.push(OrmError::Other("first".into()));
        errs.push(OrmError::validation("second"));

        let err = errs.into_result().unwrap_err();
        assert!(err.is_hook());
        assert_eq!(
            err.to_string(),
            "Hook error: first; Validation error: second"
        );
    }

    #[test]
    fn empty_hook_errors_are_ok() {
        assert!(HookErrors::new().into_result().is_ok());
    }
}
