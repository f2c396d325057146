//! Generic type parameter handling and trait bound management.
//!
//! `Structured` requires `Send + Sync + 'static`, so every type parameter gets
//! those bounds. Fields that mention a type parameter additionally get a
//! where-clause predicate on the field type itself (`Vec<T>: IntoPropertyValue`
//! rather than `T: IntoPropertyValue`), which keeps wrapper impls in charge of
//! what they need from `T`.
//!
//! ## PhantomData Handling
//!
//! `PhantomData<T>` fields are skipped when collecting generics:
//!
//! ```ignore
//! struct TypedId<T> {
//!     id: String,
//!     _marker: PhantomData<T>,  // T should NOT require IntoPropertyValue
//! }
//! ```

use syn::{parse_quote, Ident};

use crate::crate_path;

pub(crate) fn collect_generics_from_type(
    ty: &syn::Type,
    generics: &syn::Generics,
    result: &mut Vec<Ident>,
) {
    match ty {
        syn::Type::Path(path) => {
            if let Some(segment) = path.path.segments.last() {
                if segment.ident == "PhantomData" {
                    return;
                }

                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    for arg in &args.args {
                        if let syn::GenericArgument::Type(inner_ty) = arg {
                            collect_generics_from_type(inner_ty, generics, result);
                        }
                    }
                }
            }
            for segment in &path.path.segments {
                for param in generics.type_params() {
                    if segment.ident == param.ident && !result.iter().any(|g| g == &param.ident) {
                        result.push(param.ident.clone());
                    }
                }
            }
        }
        syn::Type::Reference(reference) => {
            collect_generics_from_type(&reference.elem, generics, result);
        }
        syn::Type::Slice(slice) => collect_generics_from_type(&slice.elem, generics, result),
        syn::Type::Array(array) => collect_generics_from_type(&array.elem, generics, result),
        syn::Type::Tuple(tuple) => {
            for elem in &tuple.elems {
                collect_generics_from_type(elem, generics, result);
            }
        }
        syn::Type::Paren(paren) => collect_generics_from_type(&paren.elem, generics, result),
        syn::Type::Group(group) => collect_generics_from_type(&group.elem, generics, result),
        _ => {}
    }
}

/// Requires `Send + Sync + 'static` of every type parameter.
pub(crate) fn add_thread_safe_bounds(mut generics: syn::Generics) -> syn::Generics {
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::core::marker::Send));
        param.bounds.push(parse_quote!(::core::marker::Sync));
        param.bounds.push(parse_quote!('static));
    }
    generics
}

/// Adds `FieldType: IntoPropertyValue` for read fields that mention generics.
pub(crate) fn add_read_bounds(mut generics: syn::Generics, field_types: &[syn::Type]) -> syn::Generics {
    if field_types.is_empty() {
        return generics;
    }
    let into_value = crate_path("IntoPropertyValue");
    let where_clause = generics.make_where_clause();
    for ty in field_types {
        where_clause.predicates.push(parse_quote!(#ty: #into_value));
    }
    generics
}

/// Adds `FieldType: Structured + Clone` for nested fields that mention
/// generics.
pub(crate) fn add_nested_bounds(
    mut generics: syn::Generics,
    field_types: &[syn::Type],
) -> syn::Generics {
    if field_types.is_empty() {
        return generics;
    }
    let structured = crate_path("Structured");
    let where_clause = generics.make_where_clause();
    for ty in field_types {
        where_clause
            .predicates
            .push(parse_quote!(#ty: #structured + ::core::clone::Clone));
    }
    generics
}
