//! Derive macros for relorm.
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record;
mod types;

/// Derive `relorm::Record` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use relorm::Record;
///
/// #[derive(Debug, Clone, Default, Record)]
/// #[orm(table = "users", hooks = "user_hooks")]
/// struct User {
///     #[orm(id)]
///     id: i64,
///     #[orm(column = "user_name")]
///     name: String,
///     created_at: Option<chrono::NaiveDateTime>,
///     #[orm(relation = "id,user_id")]
///     posts: Vec<Post>,
///     #[orm(relation = "id,user_id", connection = "archive")]
///     profile: Option<Profile>,
///     #[orm(skip)]
///     scratch: String,
/// }
/// ```
///
/// # Struct attributes
///
/// - `#[orm(table = "name")]` - table name, defaults to the snake_case struct name
/// - `#[orm(hooks = "path::to::fn")]` - `fn() -> HookSet<Self>` providing lifecycle hooks
///
/// # Field attributes
///
/// - `#[orm(id)]` - primary key (defaults to the `id` column)
/// - `#[orm(column = "name")]` - map the field to a different column
/// - `#[orm(skip)]` - not persisted
/// - `#[orm(relation = "local,foreign")]` - relation field, `Option<T>` for
///   one-to-one and `Vec<T>` for one-to-many
/// - `#[orm(connection = "name")]` - load a relation from a named connection
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
