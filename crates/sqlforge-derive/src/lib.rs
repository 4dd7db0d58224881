//! Derive macros for sqlforge table definitions.
//!
//! This crate provides the `#[derive(Table)]` macro, which turns a plain
//! struct into a table descriptor and a typed handle with one column
//! accessor per field.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Meta, Type};

/// Derives `TableSchema` for a struct and generates a typed table handle.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Specifies the SQL table name (optional,
///   defaults to snake_case of struct name)
///
/// # Field Attributes
///
/// - `#[column(primary_key)]` - Marks the field as primary key
/// - `#[column(name = "column_name")]` - Specifies the SQL column name
///   (optional, defaults to field name)
/// - `#[column(nullable)]` - Marks the column as nullable. `Option<T>` fields
///   are nullable without it.
/// - `#[column(autoincrement)]` - Marks the column as auto-incremented
/// - `#[column(default = "expr")]` - Declares a server-side default, so
///   INSERT may leave the column out
///
/// # Generated Items
///
/// For a struct `User`, this macro generates:
///
/// - `impl TableSchema for User` with the table descriptor
/// - `UserTable` - A cheap handle wrapping a `Table`, with `as_(alias)` and
///   one method per field returning its `ColumnRef`
/// - `User::table()` returning a fresh `UserTable`
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_table_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_table_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Table derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Table derive only supports structs",
            ));
        }
    };

    let mut column_infos: Vec<ColumnInfo> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let column_attrs = parse_column_attrs(&field.attrs)?;
        let column_name = column_attrs
            .name
            .unwrap_or_else(|| field_name.to_string());
        if column_infos.iter().any(|c| c.column_name == column_name) {
            return Err(syn::Error::new_spanned(
                field,
                format!("column {column_name} is declared more than once"),
            ));
        }
        column_infos.push(ColumnInfo {
            field_name: field_name.clone(),
            field_type: field.ty.clone(),
            column_name,
            is_primary_key: column_attrs.primary_key,
            is_nullable: column_attrs.nullable,
            is_autoincrement: column_attrs.autoincrement,
            has_default: column_attrs.has_default,
        });
    }

    let handle_name = format_ident!("{}Table", struct_name);

    // ColumnDef builders, in declaration order.
    let column_defs: Vec<TokenStream2> = column_infos
        .iter()
        .map(|info| {
            let column_name = &info.column_name;
            let field_type = &info.field_type;
            let mut def = quote! {
                ::sqlforge_core::schema::ColumnDef::with_type(
                    #column_name,
                    <#field_type as ::sqlforge_core::types::SqlType>::VALUE_TYPE,
                )
            };
            if info.is_nullable {
                def = quote! { #def.nullable() };
            }
            if info.has_default {
                def = quote! { #def.default_value() };
            }
            if info.is_autoincrement {
                def = quote! { #def.auto_increment() };
            }
            if info.is_primary_key {
                def = quote! { #def.primary_key() };
            }
            quote! { .column(#def) }
        })
        .collect();

    // Accessors index the shared definition, which holds the columns in
    // declaration order.
    let column_accessors: Vec<TokenStream2> = column_infos
        .iter()
        .enumerate()
        .map(|(index, info)| {
            let method_name = &info.field_name;
            let doc = format!("The `{}` column.", info.column_name);
            quote! {
                #[doc = #doc]
                #[must_use]
                pub fn #method_name(&self) -> ::sqlforge_core::schema::ColumnRef {
                    ::sqlforge_core::schema::ColumnRef::new(
                        self.table.reference_name(),
                        self.table.definition().columns()[#index].clone(),
                    )
                }
            }
        })
        .collect();

    let expanded = quote! {
        impl ::sqlforge_core::schema::TableSchema for #struct_name {
            const NAME: &'static str = #table_name;

            fn definition() -> ::sqlforge_core::schema::TableDef {
                ::sqlforge_core::schema::TableDef::new(#table_name)
                    #(#column_defs)*
            }
        }

        /// Typed handle of the table, optionally aliased.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct #handle_name {
            table: ::sqlforge_core::schema::Table,
        }

        impl #handle_name {
            #[must_use]
            pub fn new() -> Self {
                Self {
                    table: ::sqlforge_core::schema::Table::of::<#struct_name>(),
                }
            }

            /// Returns an aliased copy, rendered as `name AS alias`.
            #[must_use]
            pub fn as_(&self, alias: impl Into<String>) -> Self {
                Self {
                    table: self.table.as_(alias),
                }
            }

            /// The untyped table.
            #[must_use]
            pub const fn table(&self) -> &::sqlforge_core::schema::Table {
                &self.table
            }

            #(#column_accessors)*
        }

        impl ::core::default::Default for #handle_name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::core::convert::From<&#handle_name> for ::sqlforge_core::schema::Table {
            fn from(handle: &#handle_name) -> Self {
                handle.table.clone()
            }
        }

        impl ::core::convert::From<#handle_name> for ::sqlforge_core::schema::Table {
            fn from(handle: #handle_name) -> Self {
                handle.table
            }
        }

        impl ::core::convert::From<&#handle_name> for ::sqlforge_core::ast::TableExpr {
            fn from(handle: &#handle_name) -> Self {
                Self::from(&handle.table)
            }
        }

        impl #struct_name {
            /// Returns a handle of the table.
            #[must_use]
            pub fn table() -> #handle_name {
                #handle_name::new()
            }
        }
    };

    Ok(expanded)
}

struct ColumnInfo {
    field_name: Ident,
    field_type: Type,
    column_name: String,
    is_primary_key: bool,
    is_nullable: bool,
    is_autoincrement: bool,
    has_default: bool,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    primary_key: bool,
    nullable: bool,
    autoincrement: bool,
    has_default: bool,
}

fn string_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    match value {
        Expr::Lit(syn::ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("table") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    table_name = Some(string_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute"))
                }
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    // Default to snake_case of struct name
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    result.primary_key = true;
                } else if meta.path.is_ident("nullable") {
                    result.nullable = true;
                } else if meta.path.is_ident("autoincrement") {
                    result.autoincrement = true;
                } else if meta.path.is_ident("name") {
                    result.name = Some(string_value(&meta)?);
                } else if meta.path.is_ident("default") {
                    string_value(&meta)?;
                    result.has_default = true;
                } else {
                    return Err(meta.error("unsupported column attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
