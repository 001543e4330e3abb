//! Statement building.
//!
//! - [`FilterSpec`] accumulates WHERE fragments and modifiers.
//! - [`StatementBuilder`] renders SELECT/COUNT/INSERT/UPDATE/DELETE text with
//!   positional `?` arguments for a table and dialect.
//!
//! Column order in INSERT/UPDATE is always lexicographic, so the same input
//! produces byte-identical SQL.

pub mod filter;
pub mod statement;

pub use filter::FilterSpec;
pub use statement::{Assignment, Expr, Statement, StatementBuilder, expand_list_args};

#[cfg(test)]
mod tests;
