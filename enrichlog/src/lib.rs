//! Structured-logging facade with correlation ids and property masking.
//!
//! Every event written through [`Logging`] is enriched before it reaches the
//! [`EventSink`]:
//! - **Correlation**: a correlation id per execution context, kept in a
//!   sliding-expiry [`CorrelationCache`], or one id per configuration.
//! - **Location**: calling method, source file and line, each switchable.
//! - **Masking**: properties whose names are listed in the configuration are
//!   masked as they are captured, and listed members of structured values are
//!   masked as they are read.
//!
//! Values are captured as [`PropertyValue`]s. Types that should be logged as
//! records implement [`Structured`], usually through `#[derive(Structured)]`,
//! which declares member names up front. The [`TypeClassifier`] splits those
//! members into pass-through and masked sets once per type.
//!
//! What this crate does not do:
//! - format, buffer or ship events (that is the sink's job; [`SlogSink`]
//!   writes to `slog`)
//! - parse command lines or locate configuration files
//!
//! The `Structured` derive macro lives in `enrichlog-derive` and is re-exported
//! when the `derive` feature is enabled (the default).

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::default_trait_access,
    clippy::doc_markdown,
    clippy::if_not_else,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::needless_ifs,
    clippy::use_self,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::enum_glob_use,
    clippy::struct_excessive_bools,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::result_large_err,
    clippy::future_not_send,
    clippy::option_if_let_else,
    clippy::from_over_into,
    clippy::manual_inspect
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

#[cfg(feature = "derive")]
pub use enrichlog_derive::Structured;

#[allow(unused_extern_crates)]
extern crate self as enrichlog;

// Module declarations
mod classification;
mod config;
mod correlation;
mod enricher;
mod error;
mod level;
mod logging;
mod masking;
mod properties;
mod sink;
pub mod slog;
mod structured;
mod template;
mod value;

// Re-exports
pub use classification::{MemberRef, TypeClassification, TypeClassifier};
pub use config::LoggingConfig;
pub use correlation::{
    ContextId, ContextScope, CorrelationCache, CorrelationResolver, Sweeper,
    DEFAULT_CORRELATION_EXPIRY_SECS,
};
pub use enricher::{
    EventProperty, StructuringEnricher, ACCESSOR_FAILURE_PREFIX, MAX_STRUCTURE_DEPTH,
};
pub use error::{ConfigError, MemberAccessError};
pub use level::{Level, UnknownLevel};
pub use logging::{LogBuilder, Logging, LoggingBuilder};
pub use masking::{
    mask, MaskConfiguration, MaskPolicy, UnknownMaskPolicy, DEFAULT_MASK_DIGIT,
    DEFAULT_MASK_LETTER, DEFAULT_MASK_PATTERN, FALLBACK_MASK_PATTERN,
};
pub use properties::{
    LogProperty, PropertyBag, APP_NAME_PROPERTY, APP_VERSION_PROPERTY, CORRELATION_ID_PROPERTY,
    LINE_NUMBER_PROPERTY, METHOD_NAME_PROPERTY, SOURCE_FILE_PROPERTY,
};
pub use sink::{EventSink, LogEvent, MemorySink, NullSink};
pub use self::slog::SlogSink;
pub use structured::Structured;
pub use template::{Hole, MessageTemplate};
pub use value::{IntoPropertyValue, PropertyValue, Structure};
