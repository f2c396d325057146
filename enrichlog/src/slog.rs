//! `slog` integration.
//!
//! [`PropertyValue`] implements `slog::Value`: scalars are emitted through the
//! matching `emit_*` call and collections and records go through `slog`'s
//! nested-value support as serde values. [`SlogSink`] writes whole
//! [`LogEvent`]s to a `slog::Logger`.
//!
//! Values reaching this module are already masked. Unstructured objects are
//! emitted as their type name, never through their own fields.

use slog::{BorrowedKV, Key, Logger, Record, RecordLocation, RecordStatic, Serializer, KV};

use crate::{
    sink::{EventSink, LogEvent},
    value::PropertyValue,
};

/// Key carrying the error chain of exception events.
pub const EXCEPTION_KEY: &str = "Exception";

/// Key carrying the raw message template.
pub const TEMPLATE_KEY: &str = "MessageTemplate";

impl slog::Value for PropertyValue {
    fn serialize(
        &self,
        record: &Record<'_>,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> slog::Result {
        match self {
            Self::Null => serializer.emit_unit(key),
            Self::Bool(value) => serializer.emit_bool(key, *value),
            Self::I64(value) => serializer.emit_i64(key, *value),
            Self::U64(value) => serializer.emit_u64(key, *value),
            Self::F64(value) => serializer.emit_f64(key, *value),
            Self::Str(value) => serializer.emit_str(key, value),
            Self::Object(object) => serializer.emit_str(key, object.type_name()),
            Self::Sequence(_) | Self::Map(_) | Self::Structure(_) => {
                let nested = slog::Serde(self.clone());
                slog::Value::serialize(&nested, record, key, serializer)
            }
        }
    }
}

struct EventKv<'a>(&'a LogEvent);

impl KV for EventKv<'_> {
    fn serialize(&self, record: &Record<'_>, serializer: &mut dyn Serializer) -> slog::Result {
        let event = self.0;
        serializer.emit_str(Key::from(TEMPLATE_KEY), event.template.text())?;
        for property in &event.properties {
            slog::Value::serialize(
                &property.value,
                record,
                Key::from(property.name.clone()),
                serializer,
            )?;
        }
        if event.error.is_some() {
            serializer.emit_str(Key::from(EXCEPTION_KEY), &event.error_chain().join(": "))?;
        }
        Ok(())
    }
}

/// Sink writing events to a `slog::Logger`.
///
/// Levels map as `Fatal -> Critical`, `Information -> Info` and
/// `Verbose -> Trace`; the rest map by name. The rendered message becomes the
/// record message and every property becomes a key-value pair.
#[derive(Clone, Debug)]
pub struct SlogSink {
    logger: Logger,
    tag: &'static str,
}

impl SlogSink {
    /// Creates a sink writing to `logger`.
    pub fn new(logger: Logger) -> Self {
        Self { logger, tag: "" }
    }

    /// Sets the record tag.
    #[must_use]
    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }
}

impl EventSink for SlogSink {
    fn emit(&self, event: &LogEvent) {
        let location = RecordLocation {
            file: event.location.file(),
            line: event.location.line(),
            column: event.location.column(),
            function: "",
            module: module_path!(),
        };
        let record_static = RecordStatic {
            location: &location,
            tag: self.tag,
            level: event.level.to_slog(),
        };
        let kv = EventKv(event);
        self.logger.log(&Record::new(
            &record_static,
            &format_args!("{}", event.message),
            BorrowedKV(&kv),
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use slog::{o, Drain, Logger, OwnedKVList, Record};

    use super::SlogSink;
    use crate::{
        config::LoggingConfig,
        logging::Logging,
        masking::MaskPolicy,
    };

    #[derive(Clone, Default)]
    struct Messages(Arc<Mutex<Vec<(slog::Level, String)>>>);

    impl Drain for Messages {
        type Ok = ();
        type Err = slog::Never;

        fn log(&self, record: &Record<'_>, _: &OwnedKVList) -> Result<(), slog::Never> {
            if let Ok(mut messages) = self.0.lock() {
                messages.push((record.level(), record.msg().to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn writes_level_and_message() {
        let messages = Messages::default();
        let logger = Logger::root(messages.clone(), o!());
        let logging = Logging::builder(
            LoggingConfig::new()
                .with_mask_policy(MaskPolicy::MaskWithString)
                .with_masked_properties(["Password"]),
        )
        .sink(SlogSink::new(logger))
        .build();

        logging
            .level(crate::Level::Warning)
            .write("Login by {User} with {Password}", &["alice".into(), "hunter2".into()]);

        let messages = messages.0.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, slog::Level::Warning);
        assert_eq!(messages[0].1, r#"Login by "alice" with "XXXXXX""#);
    }
}
