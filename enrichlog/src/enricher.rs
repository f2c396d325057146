//! Structuring of object-valued properties.
//!
//! The enricher turns [`PropertyValue::Object`] values into
//! [`PropertyValue::Structure`] records. Members are read through
//! [`Structured::read_member`] and masked as they are read, so the object
//! itself is never modified.

use slog::{debug, Logger};

use crate::{
    classification::TypeClassifier,
    masking::MaskConfiguration,
    properties::LogProperty,
    structured::Structured,
    value::{PropertyValue, Structure},
};

/// Objects nested deeper than this render as their type name.
pub const MAX_STRUCTURE_DEPTH: usize = 10;

/// Prefix of the placeholder substituted for a member that could not be read.
pub const ACCESSOR_FAILURE_PREFIX: &str = "The property accessor threw an exception: ";

/// A property as handed to the sink.
#[derive(Clone, Debug, PartialEq)]
pub struct EventProperty {
    /// Property name.
    pub name: String,
    /// Final value.
    pub value: PropertyValue,
}

/// Walks object values through a [`TypeClassifier`] and its masking
/// configuration.
#[derive(Debug, Clone, Copy)]
pub struct StructuringEnricher<'a> {
    classifier: &'a TypeClassifier,
    logger: &'a Logger,
    max_depth: usize,
}

impl<'a> StructuringEnricher<'a> {
    /// Creates an enricher that reports member read failures to `logger`.
    pub fn new(classifier: &'a TypeClassifier, logger: &'a Logger) -> Self {
        Self {
            classifier,
            logger,
            max_depth: MAX_STRUCTURE_DEPTH,
        }
    }

    /// Overrides the nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn config(&self) -> &MaskConfiguration {
        self.classifier.config()
    }

    /// Structures every property in order.
    pub fn enrich(&self, properties: Vec<LogProperty>) -> Vec<EventProperty> {
        properties
            .into_iter()
            .map(|property| EventProperty {
                value: self.structure(property.value, property.destructure),
                name: property.name,
            })
            .collect()
    }

    /// Structures one value.
    ///
    /// A top-level object is always structured. Scalars and records pass
    /// through unchanged. Objects inside sequences and maps are structured only
    /// when `destructure` is set; otherwise they render as their type name.
    pub fn structure(&self, value: PropertyValue, destructure: bool) -> PropertyValue {
        match value {
            PropertyValue::Object(object) => self.structure_object(object.as_ref(), destructure, 0),
            PropertyValue::Sequence(_) | PropertyValue::Map(_) => {
                self.collection(value, destructure, 0)
            }
            other => other,
        }
    }

    fn collection(&self, value: PropertyValue, destructure: bool, depth: usize) -> PropertyValue {
        match value {
            PropertyValue::Sequence(items) => PropertyValue::Sequence(
                items
                    .into_iter()
                    .map(|item| self.collection(item, destructure, depth))
                    .collect(),
            ),
            PropertyValue::Map(entries) => PropertyValue::Map(
                entries
                    .into_iter()
                    .map(|(key, item)| (key, self.collection(item, destructure, depth)))
                    .collect(),
            ),
            PropertyValue::Object(object) if destructure => {
                self.structure_object(object.as_ref(), destructure, depth)
            }
            PropertyValue::Object(object) => PropertyValue::str(object.type_name()),
            other => other,
        }
    }

    fn member(&self, value: PropertyValue, destructure: bool, depth: usize) -> PropertyValue {
        match value {
            PropertyValue::Object(object) => self.structure_object(object.as_ref(), destructure, depth),
            PropertyValue::Sequence(_) | PropertyValue::Map(_) => {
                self.collection(value, destructure, depth)
            }
            other => other,
        }
    }

    fn structure_object(&self, object: &dyn Structured, destructure: bool, depth: usize) -> PropertyValue {
        if depth >= self.max_depth {
            return PropertyValue::str(object.type_name());
        }

        let classification = self.classifier.classify(object);
        let masking = self.config().is_enabled();
        let mut structure = Structure::new(classification.type_name());

        for member in classification.members() {
            let masked = masking && member.masked;
            let value = match object.read_member(member.index) {
                Ok(value) if masked => self.config().mask(&value),
                Ok(value) => self.member(value, destructure, depth + 1),
                Err(err) => {
                    debug!(self.logger, "member read failed";
                        "type" => classification.type_name(),
                        "member" => member.name,
                        "kind" => err.kind());
                    let placeholder =
                        PropertyValue::Str(format!("{ACCESSOR_FAILURE_PREFIX}{}", err.kind()));
                    if masked {
                        self.config().mask(&placeholder)
                    } else {
                        placeholder
                    }
                }
            };
            structure.members.push((member.name.to_string(), value));
        }

        PropertyValue::Structure(structure)
    }
}
