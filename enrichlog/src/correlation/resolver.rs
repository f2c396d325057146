//! Correlation id resolution.

use parking_lot::Mutex;
use uuid::Uuid;

use super::{cache::CorrelationCache, context::ContextId};

/// Where resolved ids are kept. Fixed for the lifetime of a resolver.
#[derive(Debug)]
enum Mode {
    Cached(CorrelationCache),
    Static(Mutex<Option<String>>),
}

/// Resolves the correlation id for a log call.
///
/// In cached mode every execution context has its own id, held in a
/// [`CorrelationCache`]. In static mode there is one id for the whole
/// configuration.
#[derive(Debug)]
pub struct CorrelationResolver {
    mode: Mode,
}

impl CorrelationResolver {
    /// Resolver backed by `cache`.
    pub fn cached(cache: CorrelationCache) -> Self {
        Self {
            mode: Mode::Cached(cache),
        }
    }

    /// Resolver holding a single id.
    pub fn fixed() -> Self {
        Self {
            mode: Mode::Static(Mutex::new(None)),
        }
    }

    /// Returns `true` if ids are kept per execution context.
    pub fn is_cached(&self) -> bool {
        matches!(self.mode, Mode::Cached(_))
    }

    /// Backing cache, in cached mode.
    pub fn cache(&self) -> Option<&CorrelationCache> {
        match &self.mode {
            Mode::Cached(cache) => Some(cache),
            Mode::Static(_) => None,
        }
    }

    /// Returns the id for `ctx`.
    ///
    /// An explicit id always wins and becomes the current id. Otherwise the
    /// current id is returned, or a new one is generated and installed.
    pub fn resolve(&self, ctx: ContextId, explicit: Option<&str>) -> String {
        match &self.mode {
            Mode::Cached(cache) => {
                if let Some(id) = explicit {
                    cache.replace(ctx, id);
                    return id.to_string();
                }
                if let Some(id) = cache.get(ctx) {
                    return id;
                }
                let id = generate_id();
                cache.replace(ctx, id.clone());
                id
            }
            Mode::Static(current) => {
                let mut current = current.lock();
                if let Some(id) = explicit {
                    *current = Some(id.to_string());
                    return id.to_string();
                }
                current.get_or_insert_with(generate_id).clone()
            }
        }
    }

    /// Generates a fresh id and installs it as the current id for `ctx`.
    pub fn new_correlation_id(&self, ctx: ContextId) -> String {
        let id = generate_id();
        match &self.mode {
            Mode::Cached(cache) => cache.replace(ctx, id.clone()),
            Mode::Static(current) => *current.lock() = Some(id.clone()),
        }
        id
    }

    /// Current id for `ctx` without generating one.
    pub fn current(&self, ctx: ContextId) -> Option<String> {
        match &self.mode {
            Mode::Cached(cache) => cache.get(ctx),
            Mode::Static(current) => current.lock().clone(),
        }
    }
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::{ContextId, CorrelationCache, CorrelationResolver};

    #[test]
    fn static_mode_reuses_generated_id() {
        let resolver = CorrelationResolver::fixed();
        let ctx = ContextId::current();
        let first = resolver.resolve(ctx, None);
        assert_eq!(resolver.resolve(ContextId::new(), None), first);
    }

    #[test]
    fn static_mode_explicit_id_wins() {
        let resolver = CorrelationResolver::fixed();
        let ctx = ContextId::current();
        resolver.resolve(ctx, None);
        assert_eq!(resolver.resolve(ctx, Some("abc")), "abc");
        assert_eq!(resolver.resolve(ctx, None), "abc");
    }

    #[test]
    fn cached_mode_is_per_context() {
        let resolver = CorrelationResolver::cached(CorrelationCache::new(600));
        let a = ContextId::new();
        let b = ContextId::new();
        let id_a = resolver.resolve(a, None);
        let id_b = resolver.resolve(b, None);
        assert_ne!(id_a, id_b);
        assert_eq!(resolver.resolve(a, None), id_a);
        assert_eq!(resolver.cache().and_then(|c| c.get(b)), Some(id_b));
    }

    #[test]
    fn cached_mode_explicit_id_replaces_only_its_context() {
        let resolver = CorrelationResolver::cached(CorrelationCache::new(600));
        let a = ContextId::new();
        let b = ContextId::new();
        let id_b = resolver.resolve(b, None);
        resolver.resolve(a, None);
        assert_eq!(resolver.resolve(a, Some("explicit")), "explicit");
        assert_eq!(resolver.resolve(a, None), "explicit");
        assert_eq!(resolver.resolve(b, None), id_b);
    }

    #[test]
    fn new_correlation_id_installs_fresh_id() {
        let resolver = CorrelationResolver::cached(CorrelationCache::new(600));
        let ctx = ContextId::new();
        let before = resolver.resolve(ctx, None);
        let fresh = resolver.new_correlation_id(ctx);
        assert_ne!(before, fresh);
        assert_eq!(resolver.current(ctx), Some(fresh.clone()));
        assert!(uuid::Uuid::parse_str(&fresh).is_ok());
    }

    #[test]
    fn threads_resolve_distinct_ids() {
        let resolver = std::sync::Arc::new(CorrelationResolver::cached(CorrelationCache::new(600)));
        let spawn = |resolver: std::sync::Arc<CorrelationResolver>| {
            thread::spawn(move || {
                let ctx = ContextId::current();
                (resolver.resolve(ctx, None), resolver.resolve(ctx, None))
            })
        };
        let (a1, a2) = spawn(resolver.clone()).join().unwrap();
        let (b1, b2) = spawn(resolver).join().unwrap();
        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
        assert_ne!(a1, b1);
    }
}
