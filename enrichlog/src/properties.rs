//! Per-event property collection.

use std::collections::HashSet;

use crate::{
    masking::{fold_name, MaskConfiguration},
    value::{IntoPropertyValue, PropertyValue},
};

/// Correlation id property.
pub const CORRELATION_ID_PROPERTY: &str = "CorrelationId";
/// Calling method property.
pub const METHOD_NAME_PROPERTY: &str = "MethodName";
/// Source file property.
pub const SOURCE_FILE_PROPERTY: &str = "SourceFile";
/// Source line property.
pub const LINE_NUMBER_PROPERTY: &str = "LineNumber";
/// Application name property.
pub const APP_NAME_PROPERTY: &str = "AppName";
/// Application version property.
pub const APP_VERSION_PROPERTY: &str = "AppVersion";

/// A named property attached to one event.
#[derive(Clone, Debug, PartialEq)]
pub struct LogProperty {
    /// Property name, as first written.
    pub name: String,
    /// Captured value. Already masked if the name is listed.
    pub value: PropertyValue,
    /// Structure objects nested inside collections too.
    pub destructure: bool,
}

impl LogProperty {
    /// Creates a property.
    pub fn new(name: impl Into<String>, value: impl IntoPropertyValue, destructure: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into_property_value(),
            destructure,
        }
    }
}

/// Ordered property list for one event.
///
/// Names are unique case-insensitively and the first write wins. Values added
/// under a masked name are masked as they are captured.
///
/// ```rust
/// use enrichlog::{MaskConfiguration, MaskPolicy, PropertyBag, PropertyValue};
///
/// let config = MaskConfiguration::new(MaskPolicy::MaskWithString)
///     .with_masked_properties(["Password"]);
/// let properties = PropertyBag::new(&config)
///     .add("User", "alice")
///     .add("user", "bob")
///     .add("password", "hunter2")
///     .build();
///
/// assert_eq!(properties.len(), 2);
/// assert_eq!(properties[0].value, PropertyValue::str("alice"));
/// assert_eq!(properties[1].value, PropertyValue::str("XXXXXX"));
/// ```
#[derive(Debug)]
pub struct PropertyBag<'a> {
    config: &'a MaskConfiguration,
    seen: HashSet<String>,
    properties: Vec<LogProperty>,
}

impl<'a> PropertyBag<'a> {
    /// Creates an empty bag masking against `config`.
    pub fn new(config: &'a MaskConfiguration) -> Self {
        Self {
            config,
            seen: HashSet::new(),
            properties: Vec::new(),
        }
    }

    /// Adds a property.
    #[must_use]
    pub fn add(mut self, name: impl Into<String>, value: impl IntoPropertyValue) -> Self {
        self.insert(name.into(), value.into_property_value(), false);
        self
    }

    /// Adds a property whose nested objects are structured too.
    #[must_use]
    pub fn add_destructured(mut self, name: impl Into<String>, value: impl IntoPropertyValue) -> Self {
        self.insert(name.into(), value.into_property_value(), true);
        self
    }

    /// Adds every `(name, value)` pair in order.
    #[must_use]
    pub fn add_many<I, K, V>(mut self, properties: I, destructure: bool) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoPropertyValue,
    {
        for (name, value) in properties {
            self.insert(name.into(), value.into_property_value(), destructure);
        }
        self
    }

    /// Adds a property captured elsewhere. The value is not masked again.
    pub fn push(&mut self, property: LogProperty) -> bool {
        if property.name.is_empty() || !self.seen.insert(fold_name(&property.name)) {
            return false;
        }
        self.properties.push(property);
        true
    }

    /// In-place form of [`add`](Self::add). Returns `false` if the name was
    /// empty or already present.
    pub fn insert(&mut self, name: String, value: PropertyValue, destructure: bool) -> bool {
        if name.is_empty() {
            return false;
        }
        let folded = fold_name(&name);
        if self.seen.contains(&folded) {
            return false;
        }
        let value = self.config.mask_named(&name, value);
        self.seen.insert(folded);
        self.properties.push(LogProperty {
            name,
            value,
            destructure,
        });
        true
    }

    /// Returns `true` if a property with this name, in any case, was added.
    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(&fold_name(name))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if no properties were added.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Properties in insertion order.
    pub fn build(self) -> Vec<LogProperty> {
        self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::{LogProperty, PropertyBag};
    use crate::{
        masking::{MaskConfiguration, MaskPolicy},
        PropertyValue,
    };

    #[test]
    fn first_write_wins_case_insensitively() {
        let config = MaskConfiguration::default();
        let properties = PropertyBag::new(&config).add("X", 1).add("x", 2).build();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].name, "X");
        assert_eq!(properties[0].value, PropertyValue::I64(1));
    }

    #[test]
    fn empty_names_are_ignored() {
        let config = MaskConfiguration::default();
        let bag = PropertyBag::new(&config).add("", "value");
        assert!(bag.is_empty());
    }

    #[test]
    fn masking_happens_at_capture() {
        let config = MaskConfiguration::new(MaskPolicy::MaskLettersAndNumbers)
            .with_masked_properties(["Pin"]);
        let properties = PropertyBag::new(&config)
            .add("PIN", "ab12")
            .add("Other", "ab12")
            .build();
        assert_eq!(properties[0].value, PropertyValue::str("XX**"));
        assert_eq!(properties[1].value, PropertyValue::str("ab12"));
    }

    #[test]
    fn policy_none_never_masks() {
        let config = MaskConfiguration::new(MaskPolicy::None).with_masked_properties(["Pin"]);
        let properties = PropertyBag::new(&config).add("Pin", "1234").build();
        assert_eq!(properties[0].value, PropertyValue::str("1234"));
    }

    #[test]
    fn add_many_keeps_order_and_flag() {
        let config = MaskConfiguration::default();
        let properties = PropertyBag::new(&config)
            .add_many([("B", 2), ("A", 1), ("b", 3)], true)
            .build();
        let names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
        assert!(properties.iter().all(|p| p.destructure));
    }

    #[test]
    fn push_deduplicates_without_masking() {
        let config =
            MaskConfiguration::new(MaskPolicy::MaskWithString).with_masked_properties(["Token"]);
        let mut bag = PropertyBag::new(&config);
        assert!(bag.push(LogProperty::new("Token", "already-masked", false)));
        assert!(!bag.push(LogProperty::new("TOKEN", "again", false)));
        assert!(bag.contains("token"));
        let properties = bag.build();
        assert_eq!(properties[0].value, PropertyValue::str("already-masked"));
    }
}
