//! Record derive macro implementation.

mod attrs;

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

use crate::types::{option_inner, vec_inner};

struct Column<'a> {
    ident: &'a syn::Ident,
    name: String,
}

struct RelationField<'a> {
    ident: &'a syn::Ident,
    tag: syn::LitStr,
    local: String,
    many: bool,
    connection: Option<syn::LitStr>,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let struct_attrs = attrs::struct_attrs(&input)?;
    let table = struct_attrs
        .table
        .unwrap_or_else(|| name.to_string().to_snake_case());

    let mut columns: Vec<Column> = Vec::new();
    let mut relations: Vec<RelationField> = Vec::new();
    let mut primary_key: Option<String> = None;

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_attrs = attrs::field_attrs(field)?;
        if field_attrs.skip {
            continue;
        }

        if let Some(tag) = field_attrs.relation {
            if field_attrs.id || field_attrs.column.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "a relation field cannot also be a column",
                ));
            }
            let (local, _) = attrs::relation_columns(&tag)?;
            let many = if option_inner(&field.ty).is_some() {
                false
            } else if vec_inner(&field.ty).is_some() {
                true
            } else {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "relation fields must be Option<T> (one) or Vec<T> (many)",
                ));
            };
            relations.push(RelationField {
                ident,
                tag,
                local,
                many,
                connection: field_attrs.connection,
            });
            continue;
        }

        if let Some(connection) = &field_attrs.connection {
            return Err(syn::Error::new(
                connection.span(),
                "`connection` only applies to relation fields",
            ));
        }

        let column = field_attrs.column.unwrap_or_else(|| ident.to_string());
        if columns.iter().any(|c| c.name == column) {
            return Err(syn::Error::new_spanned(
                field,
                format!("column `{column}` is mapped twice"),
            ));
        }
        if field_attrs.id {
            if primary_key.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field can be marked #[orm(id)]",
                ));
            }
            primary_key = Some(column.clone());
        }
        columns.push(Column {
            ident,
            name: column,
        });
    }

    for relation in &relations {
        if !columns.iter().any(|c| c.name == relation.local) {
            return Err(syn::Error::new(
                relation.tag.span(),
                format!("`{}` is not a column of {}", relation.local, name),
            ));
        }
    }

    let primary_key = primary_key.unwrap_or_else(|| "id".to_string());
    let field_count = columns.len();

    let field_descriptors = columns.iter().map(|Column { ident, name: column }| {
        quote! {
            ::relorm::Field {
                column: #column,
                get: |r: &#name| ::relorm::ColumnValue::to_value(&r.#ident),
                set: |r: &mut #name, v: ::relorm::Value| {
                    r.#ident = ::relorm::ColumnValue::from_value(v)
                        .map_err(|e| ::relorm::OrmError::decode(#column, e))?;
                    ::core::result::Result::Ok(())
                },
                is_zero: |r: &#name| ::relorm::ColumnValue::is_zero(&r.#ident),
                touch: |r: &mut #name,
                        now: &::relorm::__private::DateTime<::relorm::__private::Local>| {
                    match ::relorm::ColumnValue::now(now) {
                        ::core::option::Option::Some(v) => {
                            r.#ident = v;
                            true
                        }
                        ::core::option::Option::None => false,
                    }
                },
            }
        }
    });

    let relations_fn = if relations.is_empty() {
        quote! {}
    } else {
        let entries = relations.iter().map(|rel| {
            let ident = rel.ident;
            let field = ident.to_string();
            let tag = &rel.tag;
            let ctor = if rel.many {
                quote!(many)
            } else {
                quote!(one)
            };
            let connection = rel
                .connection
                .as_ref()
                .map(|c| quote!(.connection(#c)));
            quote! {
                ::relorm::Relation::#ctor(#field, #tag, |r: &mut #name| &mut r.#ident) #connection
            }
        });
        quote! {
            fn relations() -> ::std::vec::Vec<::relorm::Relation<Self>> {
                ::std::vec![#(#entries),*]
            }
        }
    };

    let hooks_fn = struct_attrs.hooks.map(|path| {
        quote! {
            fn hooks() -> ::relorm::HookSet<Self> {
                #path()
            }
        }
    });

    Ok(quote! {
        impl ::relorm::Record for #name {
            fn table_name() -> &'static str {
                #table
            }

            fn primary_key() -> &'static str {
                #primary_key
            }

            fn fields() -> &'static [::relorm::Field<Self>] {
                static FIELDS: [::relorm::Field<#name>; #field_count] = [
                    #(#field_descriptors),*
                ];
                &FIELDS
            }

            #relations_fn

            #hooks_fn
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_str(input: DeriveInput) -> String {
        expand(input).map(|t| t.to_string()).unwrap_or_else(|e| e.to_string())
    }

    #[test]
    fn default_table_is_snake_case() {
        let out = expand_str(syn::parse_quote! {
            struct BlogPost { id: i64, title: String }
        });
        assert!(out.contains("\"blog_post\""), "{out}");
        assert!(out.contains("\"id\""), "{out}");
    }

    #[test]
    fn relation_field_type_must_be_option_or_vec() {
        let err = expand(syn::parse_quote! {
            struct User {
                id: i64,
                #[orm(relation = "id,user_id")]
                profile: Profile,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("Option<T>"));
    }

    #[test]
    fn relation_local_column_must_exist() {
        let err = expand(syn::parse_quote! {
            struct User {
                id: i64,
                #[orm(relation = "uid,user_id")]
                posts: Vec<Post>,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("uid"));
    }

    #[test]
    fn generics_are_rejected() {
        assert!(
            expand(syn::parse_quote! {
                struct Wrapper<T> { id: i64, inner: T }
            })
            .is_err()
        );
    }

    #[test]
    fn connection_requires_relation() {
        let err = expand(syn::parse_quote! {
            struct User {
                id: i64,
                #[orm(connection = "db2")]
                name: String,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("relation"));
    }
}
