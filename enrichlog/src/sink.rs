//! Event sink boundary.
//!
//! The facade assembles a [`LogEvent`] and hands it to an [`EventSink`]. Sinks
//! decide how events are written; buffering, retries and wire formats belong
//! to them.

use std::{error::Error, panic::Location, sync::Arc, time::SystemTime};

use parking_lot::Mutex;

use crate::{
    enricher::EventProperty, level::Level, masking::names_match, template::MessageTemplate,
    value::PropertyValue,
};

/// A fully enriched event.
#[derive(Clone, Debug)]
pub struct LogEvent {
    /// Severity.
    pub level: Level,
    /// Time the event was written.
    pub timestamp: SystemTime,
    /// Parsed message template.
    pub template: MessageTemplate,
    /// Rendered message.
    pub message: String,
    /// Positional arguments as passed by the caller.
    pub args: Vec<PropertyValue>,
    /// Properties in emission order.
    pub properties: Vec<EventProperty>,
    /// Attached error, if any.
    pub error: Option<Arc<dyn Error + Send + Sync>>,
    /// Call site.
    pub location: &'static Location<'static>,
}

impl LogEvent {
    /// Returns the value of the property called `name`, compared
    /// case-insensitively.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|property| names_match(&property.name, name))
            .map(|property| &property.value)
    }

    /// Messages of the attached error and each of its sources, outermost
    /// first.
    pub fn error_chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current: Option<&(dyn Error + 'static)> = match self.error.as_deref() {
            Some(err) => Some(err),
            None => None,
        };
        while let Some(err) = current {
            chain.push(err.to_string());
            current = err.source();
        }
        chain
    }
}

/// Receives enriched events.
pub trait EventSink: Send + Sync {
    /// Writes one event. Must not panic on any event.
    fn emit(&self, event: &LogEvent);
}

impl<S> EventSink for Arc<S>
where
    S: EventSink + ?Sized,
{
    fn emit(&self, event: &LogEvent) {
        (**self).emit(event);
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &LogEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events written so far.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    /// Most recent event.
    pub fn last(&self) -> Option<LogEvent> {
        self.events.lock().last().cloned()
    }

    /// Number of events written.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Removes and returns every event.
    pub fn take(&self) -> Vec<LogEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &LogEvent) {
        self.events.lock().push(event.clone());
    }
}
