//! Member descriptors for values that can be destructured.
//!
//! A [`Structured`] type declares its member names once and reads members by
//! index. The classifier inspects the names; the enricher reads the values.
//! There is no runtime introspection: the descriptor is either written by hand
//! or generated by `#[derive(Structured)]`.
//!
//! ## Derive attributes
//!
//! | Attribute | Effect |
//! |-----------|--------|
//! | none | member is read through [`crate::IntoPropertyValue`] |
//! | `#[structured(skip)]` | member is not declared |
//! | `#[structured(rename = "Name")]` | member is declared under `Name` |
//! | `#[structured(nested)]` | member is cloned and wrapped as a nested object |
//! | `#[structured(getter = path)]` | member is read by `fn(&Self) -> Result<PropertyValue, MemberAccessError>` |
//!
//! Container attribute `#[structured(rename = "Name")]` overrides the type name.

use std::any::TypeId;

use crate::{error::MemberAccessError, value::PropertyValue};

/// A value whose members can be enumerated and read individually.
///
/// `member_names` must return the same slice for every instance of a type:
/// classifications are cached per type.
///
/// ```rust
/// use enrichlog::{MemberAccessError, PropertyValue, Structured};
///
/// struct Credentials {
///     user: String,
///     password: String,
/// }
///
/// impl Structured for Credentials {
///     fn type_name(&self) -> &'static str {
///         "Credentials"
///     }
///
///     fn member_names(&self) -> &'static [&'static str] {
///         &["User", "Password"]
///     }
///
///     fn read_member(&self, index: usize) -> Result<PropertyValue, MemberAccessError> {
///         match index {
///             0 => Ok(PropertyValue::str(&self.user)),
///             1 => Ok(PropertyValue::str(&self.password)),
///             _ => Err(MemberAccessError::OutOfRange { type_name: "Credentials", index }),
///         }
///     }
/// }
/// ```
pub trait Structured: Send + Sync + 'static {
    /// Name recorded on the structured record.
    fn type_name(&self) -> &'static str;

    /// Readable member names in declaration order.
    fn member_names(&self) -> &'static [&'static str];

    /// Reads the member at `index` in [`Structured::member_names`].
    fn read_member(&self, index: usize) -> Result<PropertyValue, MemberAccessError>;

    /// Identity of the concrete type, used as the classification cache key.
    fn type_key(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use std::{any::TypeId, sync::Arc};

    use super::Structured;
    use crate::{MemberAccessError, PropertyValue};

    struct Probe;

    impl Structured for Probe {
        fn type_name(&self) -> &'static str {
            "Probe"
        }

        fn member_names(&self) -> &'static [&'static str] {
            &["A"]
        }

        fn read_member(&self, index: usize) -> Result<PropertyValue, MemberAccessError> {
            match index {
                0 => Ok(PropertyValue::Bool(true)),
                _ => Err(MemberAccessError::OutOfRange {
                    type_name: "Probe",
                    index,
                }),
            }
        }
    }

    #[test]
    fn type_key_is_concrete_through_trait_object() {
        let shared: Arc<dyn Structured> = Arc::new(Probe);
        assert_eq!(shared.type_key(), TypeId::of::<Probe>());
    }

    #[test]
    fn out_of_range_read_is_an_error() {
        assert!(Probe.read_member(3).is_err());
    }
}
