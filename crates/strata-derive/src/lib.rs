//! Derive macro for declaring strata tables as Rust structs.
//!
//! This crate provides the `#[derive(Table)]` macro, which turns a struct
//! into a `strata_core::schema::Table` implementation that can be registered
//! with `Schema::builder().table_of::<...>()`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, ExprLit, Fields, GenericArgument, Ident,
    Lit, Meta, PathArguments, Type,
};

/// Derives the `Table` trait for a struct.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Specifies the SQL table name (optional,
///   defaults to the `snake_case` struct name)
///
/// # Field Attributes
///
/// - `#[column(name = "column_name")]` - Specifies the SQL column name
///   (optional, defaults to field name)
/// - `#[column(sql_type = "VARCHAR(32)")]` - Specifies the Postgres type
///   (optional for `i16`, `i32`, `i64`, `String`, `bool`, `f32`, `f64` and
///   `Vec<u8>`)
/// - `#[column(primary_key)]` - Adds the column to the primary key
/// - `#[column(unique)]` - Adds a single-column UNIQUE constraint
/// - `#[column(nullable)]` - Marks the column as nullable (`Option<T>`
///   fields are nullable already)
/// - `#[column(default = "expr")]` - Sets a raw SQL default expression
/// - `#[column(references = "table(column)")]` - Adds a foreign key
///
/// # Generated Items
///
/// For a struct `User`, this macro generates:
///
/// - `UserTable` - A type implementing `Table`, whose `definition()` builds
///   the `TableDef`
/// - Column accessor methods returning qualified `Column`s on both
///   `UserTable` and `User`
///
/// Fields named `table` or `table_name` are rejected, since their accessors
/// would collide with the generated functions of the same name.
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_table_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Accessor names already taken by the generated `table()` and
/// `table_name()` functions.
const RESERVED_ACCESSORS: [&str; 2] = ["table", "table_name"];

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

    let column_infos = fields
        .iter()
        .map(column_info)
        .collect::<syn::Result<Vec<_>>>()?;

    if !column_infos.iter().any(|c| c.is_primary_key) {
        return Err(syn::Error::new_spanned(
            struct_name,
            "Table derive requires at least one #[column(primary_key)] field",
        ));
    }

    let table_struct_name = format_ident!("{}Table", struct_name);
    let table_struct_doc = format!("Table metadata for [`{struct_name}`].");
    let definition = definition_body(&table_name, &column_infos);

    let column_accessors: Vec<TokenStream2> = column_infos
        .iter()
        .map(|info| {
            let method_name = &info.field_name;
            let column_name = &info.column_name;
            quote! {
                /// Returns the qualified column reference.
                #[inline]
                #[must_use]
                pub fn #method_name() -> ::strata_core::sql::Column {
                    ::strata_core::sql::Column::qualified(#table_name, #column_name)
                }
            }
        })
        .collect();

    Ok(quote! {
        #[doc = #table_struct_doc]
        #[derive(Debug, Clone, Copy)]
        pub struct #table_struct_name;

        impl ::strata_core::schema::Table for #table_struct_name {
            type Row = #struct_name;

            const NAME: &'static str = #table_name;

            fn definition() -> ::strata_core::error::Result<::strata_core::schema::TableDef> {
                #definition
            }
        }

        impl #table_struct_name {
            /// Returns the table name.
            #[inline]
            #[must_use]
            pub const fn table_name() -> &'static str {
                #table_name
            }

            #(#column_accessors)*
        }

        impl #struct_name {
            /// Returns the table metadata type.
            #[must_use]
            pub const fn table() -> #table_struct_name {
                #table_struct_name
            }

            #(#column_accessors)*
        }
    })
}

/// Reads one struct field into its column description.
fn column_info(field: &syn::Field) -> syn::Result<ColumnInfo> {
    let Some(field_name) = field.ident.as_ref() else {
        return Err(syn::Error::new_spanned(field, "expected a named field"));
    };
    if RESERVED_ACCESSORS.iter().any(|reserved| field_name == reserved) {
        return Err(syn::Error::new_spanned(
            field_name,
            format!(
                "field `{field_name}` would clash with the generated `{field_name}()`; \
                 rename the field and keep the column with #[column(name = \"{field_name}\")]"
            ),
        ));
    }

    let attrs = parse_column_attrs(&field.attrs)?;
    let (inner_type, is_option) = unwrap_option(&field.ty);

    let sql_type = match attrs.sql_type {
        Some(sql_type) => sql_type,
        None => infer_sql_type(inner_type).ok_or_else(|| {
            syn::Error::new_spanned(
                &field.ty,
                "cannot infer a Postgres type for this field; \
                 add #[column(sql_type = \"...\")]",
            )
        })?,
    };

    let references = match attrs.references {
        Some((raw, span)) => Some(parse_reference(&raw).ok_or_else(|| {
            syn::Error::new(span, "expected references = \"table(column)\"")
        })?),
        None => None,
    };

    Ok(ColumnInfo {
        field_name: field_name.clone(),
        column_name: attrs.name.unwrap_or_else(|| field_name.to_string()),
        sql_type,
        not_null: attrs.primary_key || !(is_option || attrs.nullable),
        is_primary_key: attrs.primary_key,
        is_unique: attrs.unique,
        default_expr: attrs.default_expr,
        references,
    })
}

/// Generates the `TableBuilder` chain behind `Table::definition()`.
fn definition_body(table_name: &str, column_infos: &[ColumnInfo]) -> TokenStream2 {
    let field_defs = column_infos.iter().map(|info| {
        let column_name = &info.column_name;
        let sql_type = &info.sql_type;
        let not_null = info.not_null.then(|| quote! { .not_null() });
        let default = info
            .default_expr
            .as_ref()
            .map(|expr| quote! { .default(#expr) });
        quote! {
            .field(
                ::strata_core::schema::Field::new(#column_name, #sql_type)
                    #not_null
                    #default
            )
        }
    });

    let primary_key_columns = column_infos
        .iter()
        .filter(|c| c.is_primary_key)
        .map(|c| c.column_name.as_str());

    let unique_constraints = column_infos.iter().filter(|c| c.is_unique).map(|info| {
        let column_name = &info.column_name;
        quote! { .unique(&[#column_name]) }
    });

    let foreign_keys = column_infos.iter().filter_map(|info| {
        let (ref_table, ref_column) = info.references.as_ref()?;
        let column_name = &info.column_name;
        Some(quote! { .references(#column_name, #ref_table, #ref_column) })
    });

    quote! {
        ::strata_core::schema::TableDef::builder(#table_name)
            #(#field_defs)*
            .primary_key(&[#(#primary_key_columns),*])
            #(#unique_constraints)*
            #(#foreign_keys)*
            .build()
    }
}

struct ColumnInfo {
    field_name: Ident,
    column_name: String,
    sql_type: String,
    not_null: bool,
    is_primary_key: bool,
    is_unique: bool,
    default_expr: Option<String>,
    references: Option<(String, String)>,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    sql_type: Option<String>,
    primary_key: bool,
    nullable: bool,
    unique: bool,
    default_expr: Option<String>,
    references: Option<(String, proc_macro2::Span)>,
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("table") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    table_name = Some(parse_str_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unknown table attribute"))
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

fn parse_str_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(ExprLit {
        lit: Lit::Str(s), ..
    }) = &value
    {
        return Ok(s.value());
    }
    Err(syn::Error::new_spanned(value, "expected a string literal"))
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
                } else if meta.path.is_ident("unique") {
                    result.unique = true;
                } else if meta.path.is_ident("name") {
                    result.name = Some(parse_str_value(&meta)?);
                } else if meta.path.is_ident("sql_type") {
                    result.sql_type = Some(parse_str_value(&meta)?);
                } else if meta.path.is_ident("default") {
                    result.default_expr = Some(parse_str_value(&meta)?);
                } else if meta.path.is_ident("references") {
                    let span = meta.path.get_ident().map_or_else(
                        proc_macro2::Span::call_site,
                        Ident::span,
                    );
                    result.references = Some((parse_str_value(&meta)?, span));
                } else {
                    return Err(meta.error("unknown column attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}

/// Splits `table(column)` into its parts.
fn parse_reference(raw: &str) -> Option<(String, String)> {
    let (table, rest) = raw.trim().split_once('(')?;
    let column = rest.strip_suffix(')')?;
    let (table, column) = (table.trim(), column.trim());
    if table.is_empty() || column.is_empty() {
        return None;
    }
    Some((String::from(table), String::from(column)))
}

/// Returns the inner type of `Option<T>`, and whether it was an option.
fn unwrap_option(ty: &Type) -> (&Type, bool) {
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return (inner, true);
                    }
                }
            }
        }
    }
    (ty, false)
}

fn infer_sql_type(ty: &Type) -> Option<String> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    let sql_type = match segment.ident.to_string().as_str() {
        "i16" => "SMALLINT",
        "i32" => "INTEGER",
        "i64" => "BIGINT",
        "f32" => "REAL",
        "f64" => "DOUBLE PRECISION",
        "bool" => "BOOLEAN",
        "String" => "TEXT",
        "Vec" => {
            let PathArguments::AngleBracketed(args) = &segment.arguments else {
                return None;
            };
            match args.args.first() {
                Some(GenericArgument::Type(Type::Path(inner))) if inner.path.is_ident("u8") => {
                    "BYTEA"
                }
                _ => return None,
            }
        }
        _ => return None,
    };
    Some(String::from(sql_type))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_field_names_are_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Seat {
                #[column(primary_key)]
                id: i64,
                table: i32,
            }
        };
        let err = derive_table_impl(&input).unwrap_err();
        assert!(err.to_string().contains("field `table` would clash"));

        let input: DeriveInput = syn::parse_quote! {
            struct Seat {
                #[column(primary_key)]
                id: i64,
                #[column(name = "table")]
                table_no: i32,
            }
        };
        assert!(derive_table_impl(&input).is_ok());
    }

    #[test]
    fn test_missing_primary_key_is_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Note {
                body: String,
            }
        };
        let err = derive_table_impl(&input).unwrap_err();
        assert!(err.to_string().contains("primary_key"));
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("BlogPost"), "blog_post");
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            parse_reference("users(id)"),
            Some((String::from("users"), String::from("id")))
        );
        assert_eq!(
            parse_reference(" users ( id ) "),
            Some((String::from("users"), String::from("id")))
        );
        assert_eq!(parse_reference("users"), None);
        assert_eq!(parse_reference("(id)"), None);
    }

    #[test]
    fn test_infer_sql_type() {
        let ty: Type = syn::parse_quote!(i64);
        assert_eq!(infer_sql_type(&ty).as_deref(), Some("BIGINT"));
        let ty: Type = syn::parse_quote!(Vec<u8>);
        assert_eq!(infer_sql_type(&ty).as_deref(), Some("BYTEA"));
        let ty: Type = syn::parse_quote!(Vec<String>);
        assert_eq!(infer_sql_type(&ty), None);
        let ty: Type = syn::parse_quote!(std::string::String);
        assert_eq!(infer_sql_type(&ty).as_deref(), Some("TEXT"));
    }

    #[test]
    fn test_unwrap_option() {
        let ty: Type = syn::parse_quote!(Option<i32>);
        let (inner, is_option) = unwrap_option(&ty);
        assert!(is_option);
        assert_eq!(infer_sql_type(inner).as_deref(), Some("INTEGER"));
    }
}
