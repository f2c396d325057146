//! Error types.
//!
//! Nothing on the logging hot path returns these to the caller. Member access
//! failures are recovered inside the enricher, and configuration errors only
//! surface when a configuration document cannot be parsed at all.

use thiserror::Error;

/// Failure reading a single member of a [`crate::Structured`] value.
///
/// The enricher replaces the member's value with a diagnostic placeholder and
/// carries on with the rest of the event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberAccessError {
    /// The member index is outside the type's declared member list.
    #[error("member index {index} is out of range for `{type_name}`")]
    OutOfRange {
        /// Type whose descriptor was read.
        type_name: &'static str,
        /// Requested member index.
        index: usize,
    },
    /// The member exists but is not readable in the value's current state.
    #[error("member `{member}` is unavailable: {reason}")]
    Unavailable {
        /// Member name.
        member: &'static str,
        /// Human readable reason.
        reason: String,
    },
    /// The accessor failed.
    #[error("accessor for `{member}` failed: {message}")]
    Accessor {
        /// Member name.
        member: &'static str,
        /// Failure message.
        message: String,
    },
}

impl MemberAccessError {
    /// Convenience constructor for accessor failures.
    pub fn accessor(member: &'static str, message: impl Into<String>) -> Self {
        Self::Accessor {
            member,
            message: message.into(),
        }
    }

    /// Short, stable name of the failure kind, used in placeholders.
    ///
    /// Never includes the member value.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "OutOfRange",
            Self::Unavailable { .. } => "Unavailable",
            Self::Accessor { .. } => "AccessorFailed",
        }
    }
}

/// Errors raised while loading a [`crate::LoggingConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON or does not match the expected shape.
    #[error("invalid logging configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A sliding expiry of zero seconds would evict every entry immediately.
    #[error("correlation cache expiry must be greater than zero")]
    ZeroExpiry,
}
