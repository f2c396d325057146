//! The logging facade.
//!
//! [`Logging`] owns one configuration snapshot (masking, classifier,
//! correlation resolver), the process-wide common properties and the sink.
//! Every log call goes through a [`LogBuilder`]:
//!
//! ```rust
//! use enrichlog::{Level, Logging, LoggingConfig, MaskPolicy, MemorySink, PropertyValue};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let logging = Logging::builder(
//!     LoggingConfig::new()
//!         .with_mask_policy(MaskPolicy::MaskWithString)
//!         .with_masked_properties(["Password"]),
//! )
//! .shared_sink(sink.clone())
//! .build();
//!
//! logging
//!     .level(Level::Information)
//!     .add_property("Password", "hunter2")
//!     .write("User {Name} signed in", &["alice".into()]);
//!
//! let event = sink.last().unwrap();
//! assert_eq!(event.property("Password"), Some(&PropertyValue::str("XXXXXX")));
//! assert_eq!(event.message, r#"User "alice" signed in"#);
//! ```

use std::{error::Error, panic::Location, sync::Arc, time::{Duration, SystemTime}};

use parking_lot::{Mutex, RwLock};
use slog::{debug, info, o, warn, Discard, Logger};

use crate::{
    classification::TypeClassifier,
    config::LoggingConfig,
    correlation::{
        ContextId, CorrelationCache, CorrelationResolver, Sweeper, DEFAULT_CORRELATION_EXPIRY_SECS,
    },
    enricher::StructuringEnricher,
    level::Level,
    masking::{fold_name, MaskConfiguration},
    properties::{
        LogProperty, PropertyBag, APP_NAME_PROPERTY, APP_VERSION_PROPERTY,
        CORRELATION_ID_PROPERTY, LINE_NUMBER_PROPERTY, METHOD_NAME_PROPERTY,
        SOURCE_FILE_PROPERTY,
    },
    sink::{EventSink, LogEvent, NullSink},
    template::MessageTemplate,
    value::{IntoPropertyValue, PropertyValue},
};

/// Everything derived from one [`LoggingConfig`].
struct LoggingState {
    config: LoggingConfig,
    mask: Arc<MaskConfiguration>,
    classifier: TypeClassifier,
    resolver: CorrelationResolver,
    sweeper: Mutex<Option<Sweeper>>,
}

impl LoggingState {
    fn new(config: LoggingConfig, diagnostics: &Logger, sweep_interval: Option<Duration>) -> Self {
        let mask = Arc::new(config.mask_configuration());
        let classifier = TypeClassifier::new(Arc::clone(&mask));

        let mut sweeper = None;
        let resolver = if config.enable_correlation_cache {
            let expiry = if config.correlation_cache_expiry == 0 {
                warn!(diagnostics, "correlation cache expiry of zero replaced by default";
                    "expiry_secs" => DEFAULT_CORRELATION_EXPIRY_SECS);
                Duration::from_secs(DEFAULT_CORRELATION_EXPIRY_SECS)
            } else {
                config.correlation_expiry()
            };
            let cache = CorrelationCache::with_diagnostics(
                expiry,
                diagnostics.new(o!("component" => "correlation-cache")),
            );
            sweeper = sweep_interval.map(|interval| cache.start_sweeper(interval));
            CorrelationResolver::cached(cache)
        } else {
            CorrelationResolver::fixed()
        };

        Self {
            config,
            mask,
            classifier,
            resolver,
            sweeper: Mutex::new(sweeper),
        }
    }
}

/// Configures a [`Logging`] facade.
#[must_use]
pub struct LoggingBuilder {
    config: LoggingConfig,
    sink: Option<Arc<dyn EventSink>>,
    diagnostics: Option<Logger>,
    sweep_interval: Option<Duration>,
}

impl LoggingBuilder {
    /// Writes events to `sink`.
    pub fn sink(self, sink: impl EventSink + 'static) -> Self {
        self.shared_sink(Arc::new(sink))
    }

    /// Writes events to an already shared sink.
    pub fn shared_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Reports internal problems, such as unreadable members, to `logger`.
    pub fn diagnostics(mut self, logger: Logger) -> Self {
        self.diagnostics = Some(logger);
        self
    }

    /// Sweeps expired correlation entries in the background every `interval`.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Builds the facade. Without a sink, events are discarded.
    pub fn build(self) -> Logging {
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Logger::root(Discard, o!()));
        let state = LoggingState::new(self.config, &diagnostics, self.sweep_interval);
        Logging {
            state: RwLock::new(Arc::new(state)),
            common: RwLock::new(Vec::new()),
            sink: self.sink.unwrap_or_else(|| Arc::new(NullSink)),
            diagnostics,
            sweep_interval: self.sweep_interval,
        }
    }
}

/// Logging facade for one application.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct Logging {
    state: RwLock<Arc<LoggingState>>,
    common: RwLock<Vec<LogProperty>>,
    sink: Arc<dyn EventSink>,
    diagnostics: Logger,
    sweep_interval: Option<Duration>,
}

impl std::fmt::Debug for Logging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logging")
            .field("config", &self.state.read().config)
            .field("common_properties", &self.common.read().len())
            .finish_non_exhaustive()
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

impl Logging {
    /// Facade discarding every event.
    pub fn new(config: LoggingConfig) -> Self {
        Self::builder(config).build()
    }

    /// Starts configuring a facade.
    pub fn builder(config: LoggingConfig) -> LoggingBuilder {
        LoggingBuilder {
            config,
            sink: None,
            diagnostics: None,
            sweep_interval: None,
        }
    }

    fn snapshot(&self) -> Arc<LoggingState> {
        Arc::clone(&self.state.read())
    }

    /// Active configuration.
    pub fn config(&self) -> LoggingConfig {
        self.snapshot().config.clone()
    }

    /// Active masking configuration.
    pub fn mask_configuration(&self) -> Arc<MaskConfiguration> {
        Arc::clone(&self.snapshot().mask)
    }

    /// Correlation cache, when ids are kept per execution context.
    pub fn correlation_cache(&self) -> Option<CorrelationCache> {
        self.snapshot().resolver.cache().cloned()
    }

    /// Number of types classified under the active configuration.
    pub fn classified_types(&self) -> usize {
        self.snapshot().classifier.len()
    }

    /// Replaces the configuration.
    ///
    /// Calls already in progress finish with the previous snapshot. The new
    /// snapshot starts with an empty classification memo and a new correlation
    /// resolver. Common properties are kept as registered.
    pub fn reconfigure(&self, config: LoggingConfig) {
        let next = Arc::new(LoggingState::new(config, &self.diagnostics, self.sweep_interval));
        let previous = std::mem::replace(&mut *self.state.write(), next);
        previous.classifier.invalidate();
        drop(previous.sweeper.lock().take());
        info!(self.diagnostics, "logging reconfigured";
            "correlation_cache" => self.snapshot().resolver.is_cached());
    }

    /// Resolves the correlation id for the current execution context.
    pub fn resolve_correlation_id(&self, explicit: Option<&str>) -> String {
        self.resolve_correlation_id_in(ContextId::current(), explicit)
    }

    /// Resolves the correlation id for `ctx`.
    pub fn resolve_correlation_id_in(&self, ctx: ContextId, explicit: Option<&str>) -> String {
        self.snapshot().resolver.resolve(ctx, explicit)
    }

    /// Generates and installs a fresh correlation id for the current context.
    pub fn new_correlation_id(&self) -> String {
        self.snapshot().resolver.new_correlation_id(ContextId::current())
    }

    /// Correlation id of the current context, if one was resolved.
    pub fn current_correlation_id(&self) -> Option<String> {
        self.snapshot().resolver.current(ContextId::current())
    }

    /// Registers a property attached to every subsequent event.
    ///
    /// An existing property with the same name, compared case-insensitively,
    /// is left alone unless `update` is set. The value is masked now if its
    /// name is listed.
    pub fn add_common_property(
        &self,
        name: impl Into<String>,
        value: impl IntoPropertyValue,
        destructure: bool,
        update: bool,
    ) {
        let name = name.into();
        if name.is_empty() {
            return;
        }
        let value = self
            .snapshot()
            .mask
            .mask_named(&name, value.into_property_value());
        let folded = fold_name(&name);

        let mut common = self.common.write();
        match common.iter_mut().find(|property| fold_name(&property.name) == folded) {
            Some(existing) if update => {
                existing.value = value;
                existing.destructure = destructure;
            }
            Some(_) => {}
            None => common.push(LogProperty {
                name,
                value,
                destructure,
            }),
        }
    }

    /// Removes every common property.
    pub fn reset_common_properties(&self) {
        self.common.write().clear();
    }

    /// Registered common properties.
    pub fn common_properties(&self) -> Vec<LogProperty> {
        self.common.read().clone()
    }

    /// Base properties for one event: correlation id, caller location and
    /// application identity, each gated by configuration.
    ///
    /// The correlation id is resolved for the current context, with
    /// `correlation_id` as the explicit id.
    pub fn build_base_properties(
        &self,
        correlation_id: Option<&str>,
        method: Option<&str>,
        source_file: Option<&str>,
        line: Option<u32>,
    ) -> Vec<LogProperty> {
        let state = self.snapshot();
        let correlation_id = state.resolver.resolve(ContextId::current(), correlation_id);
        let mut bag = PropertyBag::new(&state.mask);
        push_base_properties(&mut bag, &state.config, &correlation_id, method, source_file, line);
        bag.build()
    }

    /// Applies the active masking policy to `value`.
    pub fn mask(&self, value: &PropertyValue) -> PropertyValue {
        self.snapshot().mask.mask(value)
    }

    /// Starts an event at `level`.
    #[track_caller]
    pub fn level(&self, level: Level) -> LogBuilder<'_> {
        LogBuilder::new(self, level, None, Location::caller())
    }

    /// Starts an event carrying `error`.
    #[track_caller]
    pub fn exception(
        &self,
        error: impl Into<Box<dyn Error + Send + Sync>>,
        level: Level,
    ) -> LogBuilder<'_> {
        LogBuilder::new(self, level, Some(Arc::from(error.into())), Location::caller())
    }
}

fn push_base_properties(
    bag: &mut PropertyBag<'_>,
    config: &LoggingConfig,
    correlation_id: &str,
    method: Option<&str>,
    source_file: Option<&str>,
    line: Option<u32>,
) {
    bag.insert(
        CORRELATION_ID_PROPERTY.to_string(),
        PropertyValue::str(correlation_id),
        false,
    );
    if config.enable_method_name_property {
        if let Some(method) = method.filter(|method| !method.is_empty()) {
            bag.insert(METHOD_NAME_PROPERTY.to_string(), PropertyValue::str(method), false);
        }
    }
    if config.enable_source_file_property {
        if let Some(file) = source_file.filter(|file| !file.is_empty()) {
            bag.insert(SOURCE_FILE_PROPERTY.to_string(), PropertyValue::str(file), false);
        }
    }
    if config.enable_line_number_property {
        if let Some(line) = line {
            bag.insert(LINE_NUMBER_PROPERTY.to_string(), PropertyValue::U64(line.into()), false);
        }
    }
    if !config.app_name.is_empty() {
        bag.insert(
            APP_NAME_PROPERTY.to_string(),
            PropertyValue::str(&config.app_name),
            false,
        );
    }
    if !config.app_version.is_empty() {
        bag.insert(
            APP_VERSION_PROPERTY.to_string(),
            PropertyValue::str(&config.app_version),
            false,
        );
    }
}

/// One log call in progress.
///
/// Properties added here are masked as they are added. Nothing is emitted
/// until [`write`](Self::write).
#[must_use = "nothing is logged until `write` is called"]
pub struct LogBuilder<'a> {
    logging: &'a Logging,
    state: Arc<LoggingState>,
    level: Level,
    error: Option<Arc<dyn Error + Send + Sync>>,
    correlation_id: Option<String>,
    method: Option<String>,
    show_method: bool,
    properties: Vec<LogProperty>,
    location: &'static Location<'static>,
}

impl<'a> LogBuilder<'a> {
    fn new(
        logging: &'a Logging,
        level: Level,
        error: Option<Arc<dyn Error + Send + Sync>>,
        location: &'static Location<'static>,
    ) -> Self {
        Self {
            logging,
            state: logging.snapshot(),
            level,
            error,
            correlation_id: None,
            method: None,
            show_method: false,
            properties: Vec::new(),
            location,
        }
    }

    /// Uses `id` as the correlation id and makes it current.
    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Names the calling method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Prefixes the message with `"<method> - "`.
    pub fn show_method(mut self) -> Self {
        self.show_method = true;
        self
    }

    fn push(&mut self, name: String, value: PropertyValue, destructure: bool) {
        if name.is_empty() {
            return;
        }
        let value = self.state.mask.mask_named(&name, value);
        self.properties.push(LogProperty {
            name,
            value,
            destructure,
        });
    }

    /// Adds a property.
    pub fn add_property(mut self, name: impl Into<String>, value: impl IntoPropertyValue) -> Self {
        self.push(name.into(), value.into_property_value(), false);
        self
    }

    /// Adds a property whose nested objects are structured too.
    pub fn add_destructured(
        mut self,
        name: impl Into<String>,
        value: impl IntoPropertyValue,
    ) -> Self {
        self.push(name.into(), value.into_property_value(), true);
        self
    }

    /// Adds every `(name, value)` pair.
    pub fn add_properties<I, K, V>(mut self, properties: I, destructure: bool) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoPropertyValue,
    {
        for (name, value) in properties {
            self.push(name.into(), value.into_property_value(), destructure);
        }
        self
    }

    /// Enriches the event and hands it to the sink.
    ///
    /// `args` bind to the template's holes in order; a hole whose name is
    /// masked has its argument masked.
    pub fn write(self, template: &str, args: &[PropertyValue]) {
        let state = &self.state;
        if !self.level.is_enabled_for(state.config.log_level) {
            return;
        }

        let correlation_id = state
            .resolver
            .resolve(ContextId::current(), self.correlation_id.as_deref());

        let mut bag = PropertyBag::new(&state.mask);
        push_base_properties(
            &mut bag,
            &state.config,
            &correlation_id,
            self.method.as_deref(),
            Some(self.location.file()),
            Some(self.location.line()),
        );
        for property in self.logging.common.read().iter() {
            bag.push(property.clone());
        }
        for property in self.properties {
            bag.push(property);
        }

        let text = match self.method.as_deref() {
            Some(method) if self.show_method => {
                format!("{} - {template}", method.replace('{', "{{").replace('}', "}}"))
            }
            _ => template.to_string(),
        };
        let parsed = MessageTemplate::parse(&text);
        let bound = parsed.bind(args);
        if bound.len() < args.len() {
            debug!(self.logging.diagnostics, "template arguments left unbound";
                "template" => parsed.text(),
                "args" => args.len(),
                "bound" => bound.len());
        }
        for (hole, value) in bound {
            bag.insert(hole.name, value, hole.destructure);
        }

        let properties =
            StructuringEnricher::new(&state.classifier, &self.logging.diagnostics).enrich(bag.build());
        let message = parsed.render(&properties);

        let event = LogEvent {
            level: self.level,
            timestamp: SystemTime::now(),
            template: parsed,
            message,
            args: args.to_vec(),
            properties,
            error: self.error,
            location: self.location,
        };
        self.logging.sink.emit(&event);
    }
}

/// Name of the enclosing function, without its module path.
///
/// Closures report the function they are defined in.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __enrichlog_marker() {}
        fn __enrichlog_type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let path = __enrichlog_type_name_of(__enrichlog_marker);
        let mut path = path.strip_suffix("::__enrichlog_marker").unwrap_or(path);
        while let Some(outer) = path.strip_suffix("::{{closure}}") {
            path = outer;
        }
        path.rsplit("::").next().unwrap_or(path)
    }};
}

/// Writes an event with the calling function recorded as `MethodName`.
///
/// ```rust
/// use enrichlog::{log_event, Level, Logging, LoggingConfig, MemorySink, PropertyValue};
/// use std::sync::Arc;
///
/// fn transfer(logging: &Logging) {
///     log_event!(logging, Level::Information, "Moved {Amount} to {Account}", 25, "ACC-1");
/// }
///
/// let sink = Arc::new(MemorySink::new());
/// let logging = Logging::builder(LoggingConfig::new()).shared_sink(sink.clone()).build();
/// transfer(&logging);
///
/// let event = sink.last().unwrap();
/// assert_eq!(event.property("MethodName"), Some(&PropertyValue::str("transfer")));
/// assert_eq!(event.property("Amount"), Some(&PropertyValue::I64(25)));
/// ```
#[macro_export]
macro_rules! log_event {
    ($logging:expr, $level:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logging
            .level($level)
            .method($crate::function_name!())
            .write(
                $template,
                &[$($crate::IntoPropertyValue::into_property_value($arg)),*],
            )
    };
}
