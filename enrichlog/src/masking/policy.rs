//! Masking policies for property values.
//!
//! Policies are pure value transformations. They do not traverse structures or
//! decide which properties are sensitive; [`MaskConfiguration`] carries the
//! masked property names and the classifier and property bag consult it.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::fold_name;
use crate::value::PropertyValue;

/// Default replacement for [`MaskPolicy::MaskWithString`].
pub const DEFAULT_MASK_PATTERN: &str = "XXXXXX";

/// Replacement used when a configured pattern is empty.
pub const FALLBACK_MASK_PATTERN: &str = "******";

/// Default replacement for letters under [`MaskPolicy::MaskLettersAndNumbers`].
pub const DEFAULT_MASK_LETTER: &str = "X";

/// Default replacement for digits under [`MaskPolicy::MaskLettersAndNumbers`].
pub const DEFAULT_MASK_DIGIT: &str = "*";

/// How masked properties are transformed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MaskPolicy {
    /// No masking.
    #[default]
    None,
    /// Replace the whole value with the configured pattern.
    MaskWithString,
    /// Replace every letter and every digit with the configured characters.
    MaskLettersAndNumbers,
}

impl MaskPolicy {
    /// Parses a policy name, falling back to [`MaskPolicy::None`] for unknown input.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::MaskWithString => "MaskWithString",
            Self::MaskLettersAndNumbers => "MaskLettersAndNumbers",
        }
    }
}

impl fmt::Display for MaskPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`MaskPolicy::from_str`] for unknown policy names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownMaskPolicy(pub String);

impl fmt::Display for UnknownMaskPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mask policy `{}`", self.0)
    }
}

impl std::error::Error for UnknownMaskPolicy {}

impl FromStr for MaskPolicy {
    type Err = UnknownMaskPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        [Self::None, Self::MaskWithString, Self::MaskLettersAndNumbers]
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownMaskPolicy(trimmed.to_string()))
    }
}

impl From<String> for MaskPolicy {
    fn from(value: String) -> Self {
        Self::parse_lenient(&value)
    }
}

impl From<MaskPolicy> for String {
    fn from(value: MaskPolicy) -> Self {
        value.as_str().to_string()
    }
}

/// Immutable masking configuration shared by every caller of one initialized
/// logging configuration.
///
/// Masked property names compare case-insensitively.
#[derive(Clone, Debug)]
pub struct MaskConfiguration {
    policy: MaskPolicy,
    pattern: String,
    letter: String,
    digit: String,
    declared: Vec<String>,
    folded: HashSet<String>,
}

impl Default for MaskConfiguration {
    fn default() -> Self {
        Self::new(MaskPolicy::None)
    }
}

impl MaskConfiguration {
    /// Creates a configuration with default replacement characters and no
    /// masked names.
    #[must_use]
    pub fn new(policy: MaskPolicy) -> Self {
        Self {
            policy,
            pattern: DEFAULT_MASK_PATTERN.to_string(),
            letter: DEFAULT_MASK_LETTER.to_string(),
            digit: DEFAULT_MASK_DIGIT.to_string(),
            declared: Vec::new(),
            folded: HashSet::new(),
        }
    }

    /// Uses `pattern` for [`MaskPolicy::MaskWithString`].
    ///
    /// An empty pattern falls back to [`FALLBACK_MASK_PATTERN`].
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.pattern = if pattern.is_empty() {
            FALLBACK_MASK_PATTERN.to_string()
        } else {
            pattern
        };
        self
    }

    /// Uses the first character of `letter` to replace letters.
    #[must_use]
    pub fn with_letter_char(mut self, letter: &str) -> Self {
        self.letter = first_char_or(letter, DEFAULT_MASK_LETTER);
        self
    }

    /// Uses the first character of `digit` to replace digits.
    #[must_use]
    pub fn with_digit_char(mut self, digit: &str) -> Self {
        self.digit = first_char_or(digit, DEFAULT_MASK_DIGIT);
        self
    }

    /// Adds property names whose values are masked. Blank names are ignored.
    #[must_use]
    pub fn with_masked_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if self.folded.insert(fold_name(name)) {
                self.declared.push(name.to_string());
            }
        }
        self
    }

    /// Active policy.
    pub fn policy(&self) -> MaskPolicy {
        self.policy
    }

    /// Replacement for [`MaskPolicy::MaskWithString`].
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Letter replacement.
    pub fn letter(&self) -> &str {
        &self.letter
    }

    /// Digit replacement.
    pub fn digit(&self) -> &str {
        &self.digit
    }

    /// Masked property names as configured.
    pub fn masked_properties(&self) -> &[String] {
        &self.declared
    }

    /// Returns `true` when masking is active.
    pub fn is_enabled(&self) -> bool {
        self.policy != MaskPolicy::None
    }

    /// Returns `true` if `name` is listed, regardless of policy.
    pub fn is_masked_name(&self, name: &str) -> bool {
        !self.folded.is_empty() && self.folded.contains(&fold_name(name))
    }

    /// Applies the policy to `value`.
    pub fn mask(&self, value: &PropertyValue) -> PropertyValue {
        mask(value, self)
    }

    /// Masks `value` if masking is active and `name` is listed; otherwise
    /// returns it unchanged.
    pub fn mask_named(&self, name: &str, value: PropertyValue) -> PropertyValue {
        if self.is_enabled() && self.is_masked_name(name) {
            mask(&value, self)
        } else {
            value
        }
    }
}

fn first_char_or(value: &str, fallback: &str) -> String {
    value
        .chars()
        .next()
        .map_or_else(|| fallback.to_string(), |ch| ch.to_string())
}

/// Applies the configured policy to `value`.
///
/// - [`MaskPolicy::None`] returns the value unchanged.
/// - [`MaskPolicy::MaskWithString`] returns the pattern, whatever the input.
/// - [`MaskPolicy::MaskLettersAndNumbers`] renders the value as text and
///   replaces every alphabetic character with the letter replacement and every
///   numeric character with the digit replacement. `Null` has no text, so it
///   becomes the pattern.
///
/// This function is total.
#[must_use]
pub fn mask(value: &PropertyValue, config: &MaskConfiguration) -> PropertyValue {
    match config.policy {
        MaskPolicy::None => value.clone(),
        MaskPolicy::MaskWithString => PropertyValue::Str(config.pattern.clone()),
        MaskPolicy::MaskLettersAndNumbers => match value {
            PropertyValue::Null => PropertyValue::Str(config.pattern.clone()),
            PropertyValue::Str(text) => {
                PropertyValue::Str(mask_letters_and_numbers(text, &config.letter, &config.digit))
            }
            other => PropertyValue::Str(mask_letters_and_numbers(
                &other.render(),
                &config.letter,
                &config.digit,
            )),
        },
    }
}

fn mask_letters_and_numbers(value: &str, letter: &str, digit: &str) -> String {
    let mut masked = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_alphabetic() {
            masked.push_str(letter);
        } else if ch.is_numeric() {
            masked.push_str(digit);
        } else {
            masked.push(ch);
        }
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::{
        mask, MaskConfiguration, MaskPolicy, DEFAULT_MASK_PATTERN, FALLBACK_MASK_PATTERN,
    };
    use crate::value::PropertyValue;

    fn letters_and_numbers() -> MaskConfiguration {
        MaskConfiguration::new(MaskPolicy::MaskLettersAndNumbers)
            .with_letter_char("X")
            .with_digit_char("*")
    }

    #[test]
    fn mask_with_string_discards_shape() {
        let config = MaskConfiguration::new(MaskPolicy::MaskWithString);
        assert_eq!(
            mask(&PropertyValue::I64(42), &config),
            PropertyValue::str(DEFAULT_MASK_PATTERN)
        );
    }

    #[test]
    fn mask_with_string_is_idempotent() {
        let config = MaskConfiguration::new(MaskPolicy::MaskWithString).with_pattern("<hidden>");
        let once = mask(&PropertyValue::str("secret"), &config);
        assert_eq!(mask(&once, &config), once);
    }

    #[test]
    fn letters_and_numbers_replaces_each_class() {
        let config = letters_and_numbers();
        assert_eq!(
            mask(&PropertyValue::str("Godzilla123"), &config),
            PropertyValue::str("XXXXXXXX***")
        );
    }

    #[test]
    fn letters_and_numbers_keeps_punctuation() {
        let config = letters_and_numbers();
        assert_eq!(
            mask(&PropertyValue::str("ab-12@c.d"), &config),
            PropertyValue::str("XX-**@X.X")
        );
    }

    #[test]
    fn letters_and_numbers_covers_non_ascii_letters() {
        let config = letters_and_numbers();
        assert_eq!(
            mask(&PropertyValue::str("Überprüfung9"), &config),
            PropertyValue::str("XXXXXXXXXXX*")
        );
    }

    #[test]
    fn letters_and_numbers_stringifies_numbers() {
        let config = letters_and_numbers();
        assert_eq!(
            mask(&PropertyValue::I64(-1234), &config),
            PropertyValue::str("-****")
        );
    }

    #[test]
    fn letters_and_numbers_null_becomes_pattern() {
        let config = letters_and_numbers();
        assert_eq!(
            mask(&PropertyValue::Null, &config),
            PropertyValue::str(DEFAULT_MASK_PATTERN)
        );
    }

    #[test]
    fn none_is_identity() {
        let config = MaskConfiguration::new(MaskPolicy::None);
        let value = PropertyValue::str("visible");
        assert_eq!(mask(&value, &config), value);
    }

    #[test]
    fn empty_pattern_falls_back() {
        let config = MaskConfiguration::new(MaskPolicy::MaskWithString).with_pattern("");
        assert_eq!(config.pattern(), FALLBACK_MASK_PATTERN);
    }

    #[test]
    fn only_first_char_of_replacements_is_used() {
        let config = MaskConfiguration::new(MaskPolicy::MaskLettersAndNumbers)
            .with_letter_char("#?")
            .with_digit_char("");
        assert_eq!(config.letter(), "#");
        assert_eq!(config.digit(), "*");
    }

    #[test]
    fn masked_names_compare_case_insensitively() {
        let config = MaskConfiguration::new(MaskPolicy::MaskWithString)
            .with_masked_properties(["Password", " password ", "", "ApiKey"]);
        assert!(config.is_masked_name("PASSWORD"));
        assert!(config.is_masked_name("apikey"));
        assert!(!config.is_masked_name("user"));
        assert_eq!(config.masked_properties(), ["Password", "ApiKey"]);
    }

    #[test]
    fn mask_named_leaves_unlisted_names() {
        let config =
            MaskConfiguration::new(MaskPolicy::MaskWithString).with_masked_properties(["secret"]);
        let value = PropertyValue::str("plain");
        assert_eq!(config.mask_named("other", value.clone()), value);
        assert_eq!(
            config.mask_named("Secret", value),
            PropertyValue::str(DEFAULT_MASK_PATTERN)
        );
    }

    #[test]
    fn mask_named_is_inert_without_policy() {
        let config = MaskConfiguration::new(MaskPolicy::None).with_masked_properties(["secret"]);
        let value = PropertyValue::str("plain");
        assert_eq!(config.mask_named("secret", value.clone()), value);
    }

    #[test]
    fn policy_parsing_is_lenient() {
        assert_eq!(
            MaskPolicy::parse_lenient("masklettersandnumbers"),
            MaskPolicy::MaskLettersAndNumbers
        );
        assert_eq!(MaskPolicy::parse_lenient("scramble"), MaskPolicy::None);
        assert!("scramble".parse::<MaskPolicy>().is_err());
    }
}
