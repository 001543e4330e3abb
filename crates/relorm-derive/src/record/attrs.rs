//! `#[orm(...)]` attribute parsing for the Record derive.

use syn::{DeriveInput, LitStr, Result};

#[derive(Default)]
pub(super) struct StructAttrs {
    pub table: Option<String>,
    pub hooks: Option<syn::Path>,
}

#[derive(Default)]
pub(super) struct FieldAttrs {
    pub id: bool,
    pub skip: bool,
    pub column: Option<String>,
    pub relation: Option<LitStr>,
    pub connection: Option<LitStr>,
}

pub(super) fn struct_attrs(input: &DeriveInput) -> Result<StructAttrs> {
    let mut out = StructAttrs::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                out.table = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("hooks") {
                let lit: LitStr = meta.value()?.parse()?;
                out.hooks = Some(lit.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `table = \"...\"` or `hooks = \"...\"`"))
            }
        })?;
    }
    Ok(out)
}

pub(super) fn field_attrs(field: &syn::Field) -> Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                out.id = true;
            } else if meta.path.is_ident("skip") {
                out.skip = true;
            } else if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                out.column = Some(lit.value());
            } else if meta.path.is_ident("relation") {
                out.relation = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("connection") {
                out.connection = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error(
                    "expected one of `id`, `skip`, `column`, `relation`, `connection`",
                ));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

/// Split a `"local,foreign"` relation tag.
pub(super) fn relation_columns(tag: &LitStr) -> Result<(String, String)> {
    let value = tag.value();
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [local, foreign] if !local.is_empty() && !foreign.is_empty() => {
            Ok((local.to_string(), foreign.to_string()))
        }
        _ => Err(syn::Error::new(
            tag.span(),
            "relation must be \"local_column,foreign_column\"",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_tag_needs_two_names() {
        let ok: LitStr = syn::parse_quote!("id, user_id");
        assert_eq!(
            relation_columns(&ok).unwrap(),
            ("id".to_string(), "user_id".to_string())
        );

        for bad in ["id", "a,b,c", "id,", ""] {
            let lit = LitStr::new(bad, proc_macro2::Span::call_site());
            assert!(relation_columns(&lit).is_err(), "{bad}");
        }
    }

    #[test]
    fn parses_field_flags() {
        let field: syn::Field = syn::parse_quote! {
            #[orm(id, column = "user_id")]
            uid: i64
        };
        let attrs = field_attrs(&field).unwrap();
        assert!(attrs.id);
        assert!(!attrs.skip);
        assert_eq!(attrs.column.as_deref(), Some("user_id"));
    }
}
