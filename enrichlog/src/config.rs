//! Logging configuration.
//!
//! [`LoggingConfig`] can be built in code with the `with_*` methods or read
//! from a JSON document whose keys use PascalCase:
//!
//! ```rust
//! use enrichlog::{Level, LoggingConfig, MaskPolicy};
//!
//! let config = LoggingConfig::from_json_str(
//!     r#"{
//!         "AppName": "billing",
//!         "EnableCorrelationCache": true,
//!         "CorrelationCacheExpiry": 300,
//!         "MaskPolicy": "MaskLettersAndNumbers",
//!         "MaskProperties": "Password, CardNumber",
//!         "LogLevel": "information"
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.mask_policy, MaskPolicy::MaskLettersAndNumbers);
//! assert_eq!(config.mask_properties, ["Password", "CardNumber"]);
//! assert_eq!(config.log_level, Level::Information);
//! ```
//!
//! Unknown policy or level names fall back to `None` and `Verbose`. Every key
//! is optional.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    correlation::DEFAULT_CORRELATION_EXPIRY_SECS,
    error::ConfigError,
    level::Level,
    masking::{
        MaskConfiguration, MaskPolicy, DEFAULT_MASK_DIGIT, DEFAULT_MASK_LETTER,
        DEFAULT_MASK_PATTERN,
    },
};

/// Settings for one initialized logging facade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LoggingConfig {
    /// Emitted as `AppName` when non-empty.
    pub app_name: String,
    /// Emitted as `AppVersion` when non-empty.
    pub app_version: String,
    /// Keep one correlation id per execution context instead of one per
    /// configuration.
    pub enable_correlation_cache: bool,
    /// Sliding expiry of cached correlation ids, in seconds.
    pub correlation_cache_expiry: u64,
    /// Attach `MethodName` when the caller supplies one.
    pub enable_method_name_property: bool,
    /// Attach `SourceFile`.
    pub enable_source_file_property: bool,
    /// Attach `LineNumber`.
    pub enable_line_number_property: bool,
    /// Masking policy.
    pub mask_policy: MaskPolicy,
    /// Replacement for [`MaskPolicy::MaskWithString`].
    pub mask_pattern: String,
    /// Letter replacement for [`MaskPolicy::MaskLettersAndNumbers`].
    pub mask_character: String,
    /// Digit replacement for [`MaskPolicy::MaskLettersAndNumbers`].
    pub mask_digit: String,
    /// Names of masked properties, as a list or a comma-separated string.
    #[serde(deserialize_with = "deserialize_names")]
    pub mask_properties: Vec<String>,
    /// Least severe level that is emitted.
    pub log_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            app_version: String::new(),
            enable_correlation_cache: false,
            correlation_cache_expiry: DEFAULT_CORRELATION_EXPIRY_SECS,
            enable_method_name_property: true,
            enable_source_file_property: true,
            enable_line_number_property: true,
            mask_policy: MaskPolicy::None,
            mask_pattern: DEFAULT_MASK_PATTERN.to_string(),
            mask_character: DEFAULT_MASK_LETTER.to_string(),
            mask_digit: DEFAULT_MASK_DIGIT.to_string(),
            mask_properties: Vec::new(),
            log_level: Level::Verbose,
        }
    }
}

impl LoggingConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enable_correlation_cache && self.correlation_cache_expiry == 0 {
            return Err(ConfigError::ZeroExpiry);
        }
        Ok(())
    }

    /// Sliding expiry as a [`Duration`].
    pub fn correlation_expiry(&self) -> Duration {
        Duration::from_secs(self.correlation_cache_expiry)
    }

    /// Masking configuration derived from the masking fields.
    pub fn mask_configuration(&self) -> MaskConfiguration {
        MaskConfiguration::new(self.mask_policy)
            .with_pattern(self.mask_pattern.as_str())
            .with_letter_char(&self.mask_character)
            .with_digit_char(&self.mask_digit)
            .with_masked_properties(&self.mask_properties)
    }

    /// Sets the application name.
    #[must_use]
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Sets the application version.
    #[must_use]
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    /// Enables per-context correlation ids with the given expiry in seconds.
    #[must_use]
    pub fn with_correlation_cache(mut self, expiry_seconds: u64) -> Self {
        self.enable_correlation_cache = true;
        self.correlation_cache_expiry = expiry_seconds;
        self
    }

    /// Uses one correlation id for the whole configuration.
    #[must_use]
    pub fn without_correlation_cache(mut self) -> Self {
        self.enable_correlation_cache = false;
        self
    }

    /// Toggles the `MethodName`, `SourceFile` and `LineNumber` properties.
    #[must_use]
    pub fn with_location_properties(mut self, method: bool, file: bool, line: bool) -> Self {
        self.enable_method_name_property = method;
        self.enable_source_file_property = file;
        self.enable_line_number_property = line;
        self
    }

    /// Sets the masking policy.
    #[must_use]
    pub fn with_mask_policy(mut self, policy: MaskPolicy) -> Self {
        self.mask_policy = policy;
        self
    }

    /// Sets the [`MaskPolicy::MaskWithString`] replacement.
    #[must_use]
    pub fn with_mask_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.mask_pattern = pattern.into();
        self
    }

    /// Sets the letter and digit replacements.
    #[must_use]
    pub fn with_mask_chars(mut self, letter: impl Into<String>, digit: impl Into<String>) -> Self {
        self.mask_character = letter.into();
        self.mask_digit = digit.into();
        self
    }

    /// Adds masked property names.
    #[must_use]
    pub fn with_masked_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mask_properties.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the minimum level.
    #[must_use]
    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NameList {
    List(Vec<String>),
    Csv(String),
}

fn deserialize_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = match NameList::deserialize(deserializer)? {
        NameList::List(names) => names,
        NameList::Csv(text) => text.split(',').map(str::to_string).collect(),
    };
    Ok(names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::LoggingConfig;
    use crate::{error::ConfigError, level::Level, masking::MaskPolicy};

    #[test]
    fn empty_document_uses_defaults() {
        let config = LoggingConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.correlation_cache_expiry, 600);
        assert!(config.enable_line_number_property);
    }

    #[test]
    fn unknown_names_fall_back() {
        let config =
            LoggingConfig::from_json_str(r#"{"MaskPolicy": "Scramble", "LogLevel": "Loud"}"#)
                .unwrap();
        assert_eq!(config.mask_policy, MaskPolicy::None);
        assert_eq!(config.log_level, Level::Verbose);
    }

    #[test]
    fn masked_properties_accept_a_list() {
        let config =
            LoggingConfig::from_json_str(r#"{"MaskProperties": ["Password", " ", "Pin "]}"#)
                .unwrap();
        assert_eq!(config.mask_properties, ["Password", "Pin"]);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(matches!(
            LoggingConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LoggingConfig::from_json_str(r#"{"MaskProperties": 5}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_expiry_is_rejected_when_cache_is_on() {
        assert!(matches!(
            LoggingConfig::from_json_str(
                r#"{"EnableCorrelationCache": true, "CorrelationCacheExpiry": 0}"#
            ),
            Err(ConfigError::ZeroExpiry)
        ));
        assert!(LoggingConfig::from_json_str(r#"{"CorrelationCacheExpiry": 0}"#).is_ok());
    }

    #[test]
    fn mask_configuration_reflects_fields() {
        let mask = LoggingConfig::new()
            .with_mask_policy(MaskPolicy::MaskLettersAndNumbers)
            .with_mask_chars("#", "")
            .with_mask_pattern("")
            .with_masked_properties(["Secret"])
            .mask_configuration();
        assert_eq!(mask.letter(), "#");
        assert_eq!(mask.digit(), "*");
        assert_eq!(mask.pattern(), "******");
        assert!(mask.is_masked_name("secret"));
    }
}
