//! Parsing of `#[structured(...)]` field attributes.
//!
//! This module maps attribute syntax to member read decisions and produces
//! structured errors for invalid forms.

use proc_macro2::Span;
use syn::{spanned::Spanned, Attribute, LitStr, Meta, Result};

/// How a member's value is read.
///
/// ## Strategy Mapping
///
/// | Attribute | Strategy | Behavior |
/// |-----------|----------|----------|
/// | None | `Read` | `IntoPropertyValue::to_property_value(&self.field)` |
/// | `skip` | `Skip` | Member is not declared |
/// | `nested` | `Nested` | Field is cloned and wrapped as an object |
/// | `getter = path` | `Getter(path)` | `path(self)` returns the value or an error |
#[derive(Clone, Debug)]
pub(crate) enum Strategy {
    /// Convert the field through `IntoPropertyValue`.
    Read,
    /// Leave the field out of the member list.
    Skip,
    /// Clone the field into `PropertyValue::object`, so it is structured in
    /// turn.
    Nested,
    /// Call a fallible accessor.
    Getter(syn::Path),
}

/// Options parsed from one field's attributes.
#[derive(Clone, Debug)]
pub(crate) struct FieldOptions {
    pub(crate) strategy: Strategy,
    pub(crate) rename: Option<String>,
}

fn set_strategy(target: &mut Option<Strategy>, next: Strategy, span: Span) -> Result<()> {
    if target.is_some() {
        return Err(syn::Error::new(
            span,
            "only one of `skip`, `nested` or `getter` may be specified on a field",
        ));
    }
    *target = Some(next);
    Ok(())
}

pub(crate) fn parse_field_options(attrs: &[Attribute]) -> Result<FieldOptions> {
    let mut strategy: Option<Strategy> = None;
    let mut rename: Option<String> = None;

    for attr in attrs {
        if !attr.path().is_ident("structured") {
            continue;
        }

        match &attr.meta {
            Meta::List(list) => {
                list.parse_nested_meta(|meta| {
                    if meta.path.is_ident("skip") {
                        set_strategy(&mut strategy, Strategy::Skip, meta.path.span())
                    } else if meta.path.is_ident("nested") {
                        set_strategy(&mut strategy, Strategy::Nested, meta.path.span())
                    } else if meta.path.is_ident("getter") {
                        let path: syn::Path = meta.value()?.parse()?;
                        set_strategy(&mut strategy, Strategy::Getter(path), meta.path.span())
                    } else if meta.path.is_ident("rename") {
                        if rename.is_some() {
                            return Err(meta.error("duplicate `rename` on the same field"));
                        }
                        let name: LitStr = meta.value()?.parse()?;
                        if name.value().is_empty() {
                            return Err(syn::Error::new(name.span(), "member name cannot be empty"));
                        }
                        rename = Some(name.value());
                        Ok(())
                    } else {
                        Err(meta.error(format!(
                            "unknown field option `{}`; expected `skip`, `nested`, `getter` or `rename`",
                            meta.path
                                .get_ident()
                                .map_or_else(|| "?".to_string(), ToString::to_string)
                        )))
                    }
                })?;
            }
            Meta::Path(_) => {
                return Err(syn::Error::new(
                    attr.span(),
                    "expected options, e.g. #[structured(skip)]",
                ));
            }
            Meta::NameValue(_) => {
                return Err(syn::Error::new(
                    attr.span(),
                    "name-value syntax is not supported for #[structured]",
                ));
            }
        }
    }

    Ok(FieldOptions {
        strategy: strategy.unwrap_or(Strategy::Read),
        rename,
    })
}

#[cfg(test)]
mod tests {
    use quote::quote;
    use syn::DeriveInput;

    use super::*;

    fn parse_attrs(tokens: proc_macro2::TokenStream) -> Vec<Attribute> {
        let input: DeriveInput = syn::parse2(quote! {
            #tokens
            struct Dummy;
        })
        .expect("should parse as DeriveInput");
        input.attrs
    }

    #[test]
    fn no_attribute_returns_read() {
        let attrs = parse_attrs(quote! {});
        let options = parse_field_options(&attrs).unwrap();
        assert!(matches!(options.strategy, Strategy::Read));
        assert!(options.rename.is_none());
    }

    #[test]
    fn skip_and_nested_are_parsed() {
        let attrs = parse_attrs(quote! { #[structured(skip)] });
        assert!(matches!(
            parse_field_options(&attrs).unwrap().strategy,
            Strategy::Skip
        ));
        let attrs = parse_attrs(quote! { #[structured(nested)] });
        assert!(matches!(
            parse_field_options(&attrs).unwrap().strategy,
            Strategy::Nested
        ));
    }

    #[test]
    fn getter_takes_a_path() {
        let attrs = parse_attrs(quote! { #[structured(getter = accessors::read_pin)] });
        match parse_field_options(&attrs).unwrap().strategy {
            Strategy::Getter(path) => assert_eq!(path.segments.len(), 2),
            other => panic!("expected Getter, got {other:?}"),
        }
    }

    #[test]
    fn rename_combines_with_strategy() {
        let attrs = parse_attrs(quote! { #[structured(rename = "Password", nested)] });
        let options = parse_field_options(&attrs).unwrap();
        assert_eq!(options.rename.as_deref(), Some("Password"));
        assert!(matches!(options.strategy, Strategy::Nested));
    }

    #[test]
    fn conflicting_strategies_error() {
        let attrs = parse_attrs(quote! {
            #[structured(skip)]
            #[structured(nested)]
        });
        let result = parse_field_options(&attrs);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("only one of `skip`, `nested` or `getter`"));
    }

    #[test]
    fn empty_rename_errors() {
        let attrs = parse_attrs(quote! { #[structured(rename = "")] });
        assert!(parse_field_options(&attrs)
            .unwrap_err()
            .to_string()
            .contains("member name cannot be empty"));
    }

    #[test]
    fn unknown_option_errors() {
        let attrs = parse_attrs(quote! { #[structured(mask)] });
        assert!(parse_field_options(&attrs)
            .unwrap_err()
            .to_string()
            .contains("unknown field option"));
    }

    #[test]
    fn bare_and_name_value_forms_error() {
        let attrs = parse_attrs(quote! { #[structured] });
        assert!(parse_field_options(&attrs).is_err());
        let attrs = parse_attrs(quote! { #[structured = "x"] });
        assert!(parse_field_options(&attrs)
            .unwrap_err()
            .to_string()
            .contains("name-value syntax is not supported"));
    }

    #[test]
    fn other_attributes_ignored() {
        let attrs = parse_attrs(quote! {
            #[derive(Clone)]
            #[serde(skip)]
        });
        let options = parse_field_options(&attrs).unwrap();
        assert!(matches!(options.strategy, Strategy::Read));
    }
}
