//! Event levels.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Severity of a log event, most severe first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Level {
    /// Unrecoverable failure.
    Fatal,
    /// Failed operation.
    Error,
    /// Unexpected but handled condition.
    Warning,
    /// Normal operation.
    Information,
    /// Diagnostic detail.
    Debug,
    /// Everything.
    #[default]
    Verbose,
}

impl Level {
    const ALL: [Self; 6] = [
        Self::Fatal,
        Self::Error,
        Self::Warning,
        Self::Information,
        Self::Debug,
        Self::Verbose,
    ];

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fatal => "Fatal",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Information => "Information",
            Self::Debug => "Debug",
            Self::Verbose => "Verbose",
        }
    }

    /// Parses a level name, falling back to [`Level::Verbose`].
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    /// Returns `true` if an event at `self` passes a `minimum` threshold.
    pub fn is_enabled_for(self, minimum: Self) -> bool {
        self <= minimum
    }

    /// Matching `slog` level.
    pub fn to_slog(self) -> slog::Level {
        match self {
            Self::Fatal => slog::Level::Critical,
            Self::Error => slog::Level::Error,
            Self::Warning => slog::Level::Warning,
            Self::Information => slog::Level::Info,
            Self::Debug => slog::Level::Debug,
            Self::Verbose => slog::Level::Trace,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`Level::from_str`] for unknown names.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level `{0}`")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLevel(trimmed.to_string()))
    }
}

impl From<String> for Level {
    fn from(value: String) -> Self {
        Self::parse_lenient(&value)
    }
}

impl From<Level> for String {
    fn from(value: Level) -> Self {
        value.as_str().to_string()
    }
}

impl From<Level> for slog::Level {
    fn from(value: Level) -> Self {
        value.to_slog()
    }
}
