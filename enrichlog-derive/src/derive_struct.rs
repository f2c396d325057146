//! Struct-specific `Structured` derivation.
//!
//! This module generates the member name list and the indexed member readers,
//! and collects the field types that need where-clause bounds.

use proc_macro2::{Span, TokenStream};
use quote::{quote, quote_spanned};
use syn::{ext::IdentExt, spanned::Spanned, DataStruct, Fields, Member, Result};

use crate::{
    crate_path,
    generics::collect_generics_from_type,
    strategy::{parse_field_options, FieldOptions, Strategy},
};

pub(crate) struct StructDeriveOutput {
    pub(crate) member_names: Vec<String>,
    pub(crate) read_arms: Vec<TokenStream>,
    pub(crate) read_bound_types: Vec<syn::Type>,
    pub(crate) nested_bound_types: Vec<syn::Type>,
}

struct MemberField {
    member: Member,
    name: String,
    ty: syn::Type,
    span: Span,
    options: FieldOptions,
}

fn member_fields(fields: Fields) -> Result<Vec<MemberField>> {
    let mut members = Vec::new();
    for (index, field) in fields.into_iter().enumerate() {
        let span = field.span();
        let options = parse_field_options(&field.attrs)?;
        let (member, default_name) = match field.ident {
            Some(ident) => {
                let name = ident.unraw().to_string();
                (Member::Named(ident), name)
            }
            None => (Member::Unnamed(syn::Index::from(index)), index.to_string()),
        };
        members.push(MemberField {
            member,
            name: options.rename.clone().unwrap_or(default_name),
            ty: field.ty,
            span,
            options,
        });
    }
    Ok(members)
}

pub(crate) fn derive_struct(data: DataStruct, generics: &syn::Generics) -> Result<StructDeriveOutput> {
    let into_value = crate_path("IntoPropertyValue");
    let property_value = crate_path("PropertyValue");

    let mut member_names = Vec::new();
    let mut read_arms = Vec::new();
    let mut read_bound_types = Vec::new();
    let mut nested_bound_types = Vec::new();

    for field in member_fields(data.fields)? {
        let MemberField {
            member,
            name,
            ty,
            span,
            options,
        } = field;

        let mut mentioned = Vec::new();
        collect_generics_from_type(&ty, generics, &mut mentioned);
        let generic = !mentioned.is_empty();

        let read = match options.strategy {
            Strategy::Skip => continue,
            Strategy::Read => {
                if generic {
                    read_bound_types.push(ty);
                }
                quote_spanned! { span =>
                    ::core::result::Result::Ok(#into_value::to_property_value(&self.#member))
                }
            }
            Strategy::Nested => {
                if generic {
                    nested_bound_types.push(ty);
                }
                quote_spanned! { span =>
                    ::core::result::Result::Ok(#property_value::object(
                        ::core::clone::Clone::clone(&self.#member),
                    ))
                }
            }
            Strategy::Getter(path) => quote_spanned! { span =>
                #path(self)
            },
        };

        if member_names.contains(&name) {
            return Err(syn::Error::new(
                span,
                format!("duplicate member name `{name}`"),
            ));
        }

        let index = member_names.len();
        read_arms.push(quote! { #index => #read, });
        member_names.push(name);
    }

    Ok(StructDeriveOutput {
        member_names,
        read_arms,
        read_bound_types,
        nested_bound_types,
    })
}

#[cfg(test)]
mod tests {
    use syn::{parse_quote, Data, DeriveInput};

    use super::*;

    fn derive(input: DeriveInput) -> Result<StructDeriveOutput> {
        match input.data {
            Data::Struct(data) => derive_struct(data, &input.generics),
            _ => panic!("expected a struct"),
        }
    }

    #[test]
    fn named_fields_keep_declaration_order() {
        let output = derive(parse_quote! {
            struct Login {
                #[structured(rename = "Name")]
                user: String,
                #[structured(skip)]
                attempts: u32,
                r#type: String,
                #[structured(rename = "Password")]
                password: String,
            }
        })
        .unwrap();
        assert_eq!(output.member_names, ["Name", "type", "Password"]);
        assert_eq!(output.read_arms.len(), 3);
    }

    #[test]
    fn tuple_fields_are_named_by_index() {
        let output = derive(parse_quote! {
            struct Pair(String, #[structured(skip)] u8, u64);
        })
        .unwrap();
        assert_eq!(output.member_names, ["0", "2"]);
    }

    #[test]
    fn unit_struct_has_no_members() {
        let output = derive(parse_quote! { struct Marker; }).unwrap();
        assert!(output.member_names.is_empty());
    }

    #[test]
    fn only_generic_fields_get_bounds() {
        let output = derive(parse_quote! {
            struct Envelope<T, U> {
                id: String,
                body: Vec<T>,
                #[structured(nested)]
                inner: U,
            }
        })
        .unwrap();
        assert_eq!(output.read_bound_types.len(), 1);
        assert_eq!(output.nested_bound_types.len(), 1);
    }

    #[test]
    fn duplicate_member_names_error() {
        let result = derive(parse_quote! {
            struct Clash {
                #[structured(rename = "id")]
                a: String,
                id: String,
            }
        });
        assert!(result
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default()
            .contains("duplicate member name `id`"));
    }

    #[test]
    fn skipped_field_does_not_clash() {
        let output = derive(parse_quote! {
            struct Order {
                #[structured(rename = "id")]
                order_id: String,
                #[structured(skip)]
                id: u64,
            }
        })
        .unwrap();
        assert_eq!(output.member_names, ["id"]);
    }
}
