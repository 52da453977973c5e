//! Derive macro for quill records.
//!
//! This crate provides `#[derive(Record)]`, which turns a struct with named
//! fields into a compile-time field-descriptor table for `quill-core`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Path, Type};

/// Derives `quill_core::schema::Record` (and, by default, an empty
/// `quill_core::schema::Hooks`) for a struct.
///
/// # Attributes
///
/// - `#[record(table = "name")]` - SQL table name (optional, defaults to the
///   struct name as written)
/// - `#[record(hooks)]` - the struct implements `Hooks` itself
/// - `#[record(crate = "path")]` - path to `quill_core` (optional, defaults
///   to `::quill_core`); crates depending only on `quill-orm` use
///   `#[record(crate = "quill_orm::quill_core")]`
///
/// # Field Attributes
///
/// - `#[record(column = "name")]` - SQL column name (optional, defaults to
///   the field name)
/// - `#[record(tag = "PRIMARY KEY")]` - constraint text copied verbatim into
///   `CREATE TABLE`
/// - `#[record(skip)]` - not a column; rebuilt with `Default::default()` when
///   reading rows
///
/// Every column field's type must implement `quill_core::value::ColumnType`
/// and `Clone`.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_record_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_record_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let struct_attrs = parse_struct_attrs(&input.attrs)?;
    let table_name = struct_attrs
        .table
        .unwrap_or_else(|| struct_name.to_string());
    let krate: Path = struct_attrs
        .krate
        .unwrap_or_else(|| syn::parse_quote!(::quill_core));

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record derive only supports structs",
            ));
        }
    };

    let mut columns: Vec<ColumnInfo> = Vec::new();
    let mut skipped: Vec<Ident> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            skipped.push(field_name);
            continue;
        }
        columns.push(ColumnInfo {
            column_name: attrs.column.unwrap_or_else(|| field_name.to_string()),
            field_name,
            field_type: field.ty.clone(),
            tag: attrs.tag.unwrap_or_default(),
        });
    }

    let field_defs: Vec<TokenStream2> = columns
        .iter()
        .map(|info| {
            let name = &info.column_name;
            let ty = &info.field_type;
            let tag = &info.tag;
            quote! {
                #krate::schema::FieldDef {
                    name: #name,
                    kind: <#ty as #krate::value::ColumnType>::KIND,
                    tag: #tag,
                }
            }
        })
        .collect();

    let value_exprs: Vec<TokenStream2> = columns
        .iter()
        .map(|info| {
            let field = &info.field_name;
            quote! {
                #krate::value::ToSqlValue::to_sql_value(
                    ::core::clone::Clone::clone(&self.#field)
                )
            }
        })
        .collect();

    let column_inits: Vec<TokenStream2> = columns
        .iter()
        .map(|info| {
            let field = &info.field_name;
            let ty = &info.field_type;
            let name = &info.column_name;
            quote! { #field: row.get::<#ty>(#name)? }
        })
        .collect();

    let skipped_inits: Vec<TokenStream2> = skipped
        .iter()
        .map(|field| quote! { #field: ::core::default::Default::default() })
        .collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let hooks_impl = if struct_attrs.hooks {
        quote! {}
    } else {
        quote! {
            impl #impl_generics #krate::schema::Hooks for #struct_name #ty_generics #where_clause {}
        }
    };

    let expanded = quote! {
        impl #impl_generics #krate::schema::Record for #struct_name #ty_generics #where_clause {
            const TABLE_NAME: &'static str = #table_name;
            const FIELDS: &'static [#krate::schema::FieldDef] = &[
                #(#field_defs),*
            ];

            fn record_values(&self) -> ::std::vec::Vec<#krate::value::SqlValue> {
                ::std::vec![#(#value_exprs),*]
            }

            #[allow(unused_variables)]
            fn from_row(
                row: &#krate::value::Row,
            ) -> ::core::result::Result<Self, #krate::value::ValueError> {
                ::core::result::Result::Ok(Self {
                    #(#column_inits,)*
                    #(#skipped_inits,)*
                })
            }
        }

        #hooks_impl
    };

    Ok(expanded)
}

struct ColumnInfo {
    field_name: Ident,
    field_type: Type,
    column_name: String,
    tag: String,
}

#[derive(Default)]
struct StructAttrs {
    table: Option<String>,
    hooks: bool,
    krate: Option<Path>,
}

#[derive(Default)]
struct FieldAttrs {
    column: Option<String>,
    tag: Option<String>,
    skip: bool,
}

fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<StructAttrs> {
    let mut result = StructAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                result.table = Some(parse_str_value(&meta)?);
            } else if meta.path.is_ident("hooks") {
                result.hooks = true;
            } else if meta.path.is_ident("crate") {
                let path = parse_str_value(&meta)?;
                result.krate = Some(syn::parse_str(&path).map_err(|e| meta.error(e))?);
            } else {
                return Err(meta.error("unknown record attribute"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                result.skip = true;
            } else if meta.path.is_ident("column") {
                result.column = Some(parse_str_value(&meta)?);
            } else if meta.path.is_ident("tag") {
                result.tag = Some(parse_str_value(&meta)?);
            } else {
                return Err(meta.error("unknown record field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}

// Tags and names must be string literals, so DDL text always comes from source.
fn parse_str_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(lit) = &value {
        if let Lit::Str(s) = &lit.lit {
            return Ok(s.value());
        }
    }
    Err(syn::Error::new_spanned(value, "expected a string literal"))
}
