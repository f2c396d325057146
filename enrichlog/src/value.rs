//! Property values carried by log events.
//!
//! [`PropertyValue`] decides scalar-vs-structured treatment:
//!
//! - scalars (`Null`, `Bool`, numbers, `Str`) are emitted verbatim,
//! - `Sequence` and `Map` are collections and bypass classification,
//! - `Object` holds a shared [`Structured`] value that has not been walked yet,
//! - `Structure` is the walked, possibly masked, record the enricher produces.
//!
//! Values are converted with [`IntoPropertyValue`], which is implemented for
//! common std types the same way for every caller.

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    fmt,
    hash::BuildHasher,
    sync::Arc,
};

use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serialize, Serializer,
};

use crate::structured::Structured;

/// A structured record produced by walking a [`Structured`] value.
#[derive(Clone, Debug, PartialEq)]
pub struct Structure {
    /// Name of the type the record was captured from.
    pub type_name: Cow<'static, str>,
    /// Members in declaration order.
    pub members: Vec<(String, PropertyValue)>,
}

impl Structure {
    /// Creates an empty record for `type_name`.
    pub fn new(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            members: Vec::new(),
        }
    }

    /// Returns the value of the member called `name`, if present.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, value)| value)
    }
}

/// A log property value.
#[derive(Clone)]
pub enum PropertyValue {
    /// Absent value.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Signed integer scalar.
    I64(i64),
    /// Unsigned integer scalar.
    U64(u64),
    /// Floating point scalar.
    F64(f64),
    /// Text scalar.
    Str(String),
    /// Ordered collection.
    Sequence(Vec<PropertyValue>),
    /// Keyed collection, in insertion order.
    Map(Vec<(String, PropertyValue)>),
    /// Record captured from a [`Structured`] value.
    Structure(Structure),
    /// Shared object awaiting structuring.
    Object(Arc<dyn Structured>),
}

impl PropertyValue {
    /// Wraps a [`Structured`] value so the enricher can walk it later.
    pub fn object<T: Structured>(value: T) -> Self {
        Self::Object(Arc::new(value))
    }

    /// Wraps an already shared [`Structured`] value.
    pub fn from_arc(value: Arc<dyn Structured>) -> Self {
        Self::Object(value)
    }

    /// Text value.
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Returns `true` for values emitted verbatim without any walking.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::I64(_) | Self::U64(_) | Self::F64(_) | Self::Str(_)
        )
    }

    /// Returns `true` for sequences and maps.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Sequence(_) | Self::Map(_))
    }

    /// Returns the text of a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the record of a `Structure` value.
    pub fn as_structure(&self) -> Option<&Structure> {
        match self {
            Self::Structure(structure) => Some(structure),
            _ => None,
        }
    }

    /// Renders the value as text.
    ///
    /// Collections and records render as JSON; unstructured objects render as
    /// their type name.
    pub fn render(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(value) => value.to_string(),
            Self::I64(value) => value.to_string(),
            Self::U64(value) => value.to_string(),
            Self::F64(value) => value.to_string(),
            Self::Str(value) => value.clone(),
            Self::Object(object) => object.type_name().to_string(),
            Self::Sequence(_) | Self::Map(_) | Self::Structure(_) => serde_json::to_string(self)
                .unwrap_or_else(|_| "Failed to serialize property value".to_string()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::I64(value) => f.debug_tuple("I64").field(value).finish(),
            Self::U64(value) => f.debug_tuple("U64").field(value).finish(),
            Self::F64(value) => f.debug_tuple("F64").field(value).finish(),
            Self::Str(value) => f.debug_tuple("Str").field(value).finish(),
            Self::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Self::Structure(structure) => f.debug_tuple("Structure").field(structure).finish(),
            // Never format the object itself: it has not been masked yet.
            Self::Object(object) => f.debug_tuple("Object").field(&object.type_name()).finish(),
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::U64(a), Self::U64(b)) => a == b,
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Structure(a), Self::Structure(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Structure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.members.len()))?;
        for (name, value) in &self.members {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::I64(value) => serializer.serialize_i64(*value),
            Self::U64(value) => serializer.serialize_u64(*value),
            Self::F64(value) => serializer.serialize_f64(*value),
            Self::Str(value) => serializer.serialize_str(value),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Structure(structure) => structure.serialize(serializer),
            Self::Object(object) => serializer.serialize_str(object.type_name()),
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as JsonValue;
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(value) => Self::Bool(value),
            JsonValue::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Self::I64(value)
                } else if let Some(value) = number.as_u64() {
                    Self::U64(value)
                } else {
                    Self::F64(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(value) => Self::Str(value),
            JsonValue::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

macro_rules! impl_from_for_property_value {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    IntoPropertyValue::into_property_value(value)
                }
            }
        )+
    };
}

impl_from_for_property_value!(bool, i32, i64, u32, u64, f64, usize, &str, String);

// =============================================================================
// IntoPropertyValue - conversion from caller values
// =============================================================================

/// Converts a value into a [`PropertyValue`].
///
/// Implemented for scalars, strings, `Option`, `Vec`, slices, string-keyed
/// maps, `serde_json::Value`, and shared [`Structured`] values. Types that
/// derive `Structured` are wrapped with [`PropertyValue::object`].
pub trait IntoPropertyValue {
    /// Borrowing conversion.
    fn to_property_value(&self) -> PropertyValue;

    /// Consuming conversion.
    fn into_property_value(self) -> PropertyValue
    where
        Self: Sized,
    {
        self.to_property_value()
    }
}

macro_rules! impl_into_property_value {
    ($variant:ident as $target:ty: $($ty:ty),+) => {
        $(
            impl IntoPropertyValue for $ty {
                fn to_property_value(&self) -> PropertyValue {
                    PropertyValue::$variant(<$target>::from(*self))
                }
            }
        )+
    };
}

impl_into_property_value!(I64 as i64: i8, i16, i32, i64);
impl_into_property_value!(U64 as u64: u8, u16, u32, u64);
impl_into_property_value!(F64 as f64: f32, f64);
impl_into_property_value!(Bool as bool: bool);

impl IntoPropertyValue for isize {
    fn to_property_value(&self) -> PropertyValue {
        i64::try_from(*self).map_or_else(|_| PropertyValue::Str(self.to_string()), PropertyValue::I64)
    }
}

impl IntoPropertyValue for usize {
    fn to_property_value(&self) -> PropertyValue {
        u64::try_from(*self).map_or_else(|_| PropertyValue::Str(self.to_string()), PropertyValue::U64)
    }
}

impl IntoPropertyValue for char {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Str(self.to_string())
    }
}

impl IntoPropertyValue for str {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Str(self.to_string())
    }
}

impl IntoPropertyValue for String {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Str(self.clone())
    }

    fn into_property_value(self) -> PropertyValue {
        PropertyValue::Str(self)
    }
}

impl IntoPropertyValue for Cow<'_, str> {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Str(self.to_string())
    }
}

impl IntoPropertyValue for PropertyValue {
    fn to_property_value(&self) -> PropertyValue {
        self.clone()
    }

    fn into_property_value(self) -> PropertyValue {
        self
    }
}

impl IntoPropertyValue for serde_json::Value {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::from(self.clone())
    }

    fn into_property_value(self) -> PropertyValue {
        PropertyValue::from(self)
    }
}

impl<T> IntoPropertyValue for &T
where
    T: IntoPropertyValue + ?Sized,
{
    fn to_property_value(&self) -> PropertyValue {
        (**self).to_property_value()
    }
}

impl<T> IntoPropertyValue for Option<T>
where
    T: IntoPropertyValue,
{
    fn to_property_value(&self) -> PropertyValue {
        self.as_ref()
            .map_or(PropertyValue::Null, IntoPropertyValue::to_property_value)
    }

    fn into_property_value(self) -> PropertyValue {
        self.map_or(PropertyValue::Null, IntoPropertyValue::into_property_value)
    }
}

impl<T> IntoPropertyValue for [T]
where
    T: IntoPropertyValue,
{
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Sequence(self.iter().map(IntoPropertyValue::to_property_value).collect())
    }
}

impl<T> IntoPropertyValue for Vec<T>
where
    T: IntoPropertyValue,
{
    fn to_property_value(&self) -> PropertyValue {
        self.as_slice().to_property_value()
    }

    fn into_property_value(self) -> PropertyValue {
        PropertyValue::Sequence(
            self.into_iter()
                .map(IntoPropertyValue::into_property_value)
                .collect(),
        )
    }
}

impl<V, S> IntoPropertyValue for HashMap<String, V, S>
where
    V: IntoPropertyValue,
    S: BuildHasher,
{
    fn to_property_value(&self) -> PropertyValue {
        // Sort keys so the rendered map is deterministic.
        let mut entries: Vec<(String, PropertyValue)> = self
            .iter()
            .map(|(key, value)| (key.clone(), value.to_property_value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        PropertyValue::Map(entries)
    }
}

impl<V> IntoPropertyValue for BTreeMap<String, V>
where
    V: IntoPropertyValue,
{
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Map(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_property_value()))
                .collect(),
        )
    }
}

impl<T> IntoPropertyValue for Arc<T>
where
    T: Structured,
{
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Object(self.clone())
    }
}

impl IntoPropertyValue for Arc<dyn Structured> {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Object(self.clone())
    }
}
