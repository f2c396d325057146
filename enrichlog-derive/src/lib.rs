//! Derive macros for `enrichlog`.
//!
//! This crate generates the member descriptor behind `#[derive(Structured)]`.
//! It:
//! - reads `#[structured(...)]` container and field attributes
//! - emits a `Structured` implementation with a static member name list and
//!   one reader per member
//!
//! It does **not** decide which members are masked. Masking is configured at
//! runtime by member name in the main `enrichlog` crate.

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::default_trait_access,
    clippy::doc_markdown,
    clippy::if_not_else,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::needless_ifs,
    clippy::use_self,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::enum_glob_use,
    clippy::struct_excessive_bools,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::result_large_err,
    clippy::future_not_send,
    clippy::option_if_let_else,
    clippy::from_over_into,
    clippy::manual_inspect
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

#[allow(unused_extern_crates)]
extern crate proc_macro;

use proc_macro2::TokenStream;
use proc_macro_crate::{crate_name, FoundCrate};
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, LitStr, Result};

mod container;
mod derive_struct;
mod generics;
mod strategy;
use container::{parse_container_options, ContainerOptions};
use derive_struct::{derive_struct, StructDeriveOutput};
use generics::{add_nested_bounds, add_read_bounds, add_thread_safe_bounds};

/// Derives `enrichlog::Structured` for structs.
///
/// # Container Attributes
///
/// - `#[structured(rename = "Name")]` - Report `Name` as the type name instead of the struct's
///   identifier.
///
/// # Field Attributes
///
/// - **No annotation**: The member is declared under the field's name and read with
///   `IntoPropertyValue::to_property_value(&self.field)`.
///
/// - `#[structured(skip)]`: The field is not declared as a member.
///
/// - `#[structured(rename = "Name")]`: The member is declared as `Name`. Masking matches on
///   this name.
///
/// - `#[structured(nested)]`: The field's type implements `Structured + Clone`; the field is
///   cloned and wrapped with `PropertyValue::object`, so the enricher structures it in turn.
///
/// - `#[structured(getter = path)]`: The member is read by calling
///   `path(&self) -> Result<PropertyValue, MemberAccessError>`. A returned error is replaced by a
///   placeholder when the event is enriched.
///
/// Tuple struct members are named by position (`"0"`, `"1"`, ...). Enums, unions and types with
/// lifetime parameters are rejected at compile time.
#[proc_macro_derive(Structured, attributes(structured))]
pub fn derive_structured(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// Returns the token stream to reference the enrichlog crate root.
///
/// Handles crate renaming (e.g., `logs = { package = "enrichlog", ... }`)
/// and internal usage (when derive is used inside the enrichlog crate itself).
fn crate_root() -> TokenStream {
    match crate_name("enrichlog") {
        Ok(FoundCrate::Itself) => quote! { crate },
        Ok(FoundCrate::Name(name)) => {
            let ident = format_ident!("{}", name);
            quote! { ::#ident }
        }
        Err(_) => quote! { ::enrichlog },
    }
}

fn crate_path(item: &str) -> TokenStream {
    let root = crate_root();
    let item_ident = format_ident!("{}", item);
    quote! { #root::#item_ident }
}

fn expand(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput {
        ident,
        generics,
        data,
        attrs,
        ..
    } = input;

    let data = match data {
        Data::Struct(data) => data,
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span(),
                "`Structured` cannot be derived for enums",
            ));
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span(),
                "`Structured` cannot be derived for unions",
            ));
        }
    };

    if let Some(lifetime) = generics.lifetimes().next() {
        return Err(syn::Error::new(
            lifetime.span(),
            "`Structured` cannot be derived for types with lifetime parameters",
        ));
    }

    let ContainerOptions { rename } = parse_container_options(&attrs)?;
    let type_name = LitStr::new(&rename.unwrap_or_else(|| ident.to_string()), ident.span());

    let StructDeriveOutput {
        member_names,
        read_arms,
        read_bound_types,
        nested_bound_types,
    } = derive_struct(data, &generics)?;

    let impl_generics = add_thread_safe_bounds(generics.clone());
    let impl_generics = add_read_bounds(impl_generics, &read_bound_types);
    let impl_generics = add_nested_bounds(impl_generics, &nested_bound_types);
    let (impl_generics, ty_generics, where_clause) = impl_generics.split_for_impl();

    let crate_root = crate_root();

    Ok(quote! {
        impl #impl_generics #crate_root::Structured for #ident #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn member_names(&self) -> &'static [&'static str] {
                &[#(#member_names),*]
            }

            #[allow(unused_variables)]
            fn read_member(
                &self,
                index: usize,
            ) -> ::core::result::Result<#crate_root::PropertyValue, #crate_root::MemberAccessError> {
                match index {
                    #(#read_arms)*
                    _ => ::core::result::Result::Err(#crate_root::MemberAccessError::OutOfRange {
                        type_name: #type_name,
                        index,
                    }),
                }
            }
        }
    })
}
