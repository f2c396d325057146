//! Correlation cache with sliding expiration.

use std::{
    sync::{mpsc, Arc, Weak},
    thread,
    time::{Duration, Instant},
};

use dashmap::{mapref::entry::Entry, DashMap};
use slog::{debug, o, warn, Discard, Logger};

use super::context::ContextId;

/// Default sliding window, in seconds.
pub const DEFAULT_CORRELATION_EXPIRY_SECS: u64 = 600;

#[derive(Debug, Clone)]
struct CorrelationEntry {
    value: String,
    last_access: Instant,
}

impl CorrelationEntry {
    fn new(value: String, now: Instant) -> Self {
        Self {
            value,
            last_access: now,
        }
    }

    fn is_expired(&self, now: Instant, expiry: Duration) -> bool {
        now.saturating_duration_since(self.last_access) > expiry
    }
}

struct Inner {
    entries: DashMap<ContextId, CorrelationEntry>,
    expiry: Duration,
    logger: Logger,
}

impl Inner {
    fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now, self.expiry);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

/// Concurrent map from execution context to correlation id.
///
/// Every successful [`get`](Self::get) or [`replace`](Self::replace) resets
/// the entry's window, so an entry read more often than the expiry never
/// expires. Expired entries are dropped lazily on access, by
/// [`sweep`](Self::sweep), or by a background [`Sweeper`].
///
/// Cloning is cheap; clones share the same entries.
#[derive(Clone)]
pub struct CorrelationCache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CorrelationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationCache")
            .field("entries", &self.inner.entries.len())
            .field("expiry", &self.inner.expiry)
            .finish()
    }
}

impl Default for CorrelationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CORRELATION_EXPIRY_SECS)
    }
}

impl CorrelationCache {
    /// Creates a cache whose entries expire after `expiry_seconds` without access.
    pub fn new(expiry_seconds: u64) -> Self {
        Self::with_expiry(Duration::from_secs(expiry_seconds))
    }

    /// Creates a cache with an arbitrary sliding window.
    pub fn with_expiry(expiry: Duration) -> Self {
        Self::with_diagnostics(expiry, Logger::root(Discard, o!()))
    }

    /// Creates a cache that reports sweeper activity to `logger`.
    pub fn with_diagnostics(expiry: Duration, logger: Logger) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                expiry,
                logger,
            }),
        }
    }

    /// Sliding window length.
    pub fn expiry(&self) -> Duration {
        self.inner.expiry
    }

    /// Returns the id cached for `ctx` and refreshes its window.
    pub fn get(&self, ctx: ContextId) -> Option<String> {
        let now = Instant::now();
        let expiry = self.inner.expiry;
        match self.inner.entries.get_mut(&ctx) {
            Some(mut entry) if !entry.is_expired(now, expiry) => {
                entry.last_access = now;
                return Some(entry.value.clone());
            }
            Some(_) => {}
            None => return None,
        }
        // The shard guard is released above; a concurrent replace may have
        // revived the entry since, so only drop it if it is still stale.
        self.inner
            .entries
            .remove_if(&ctx, |_, entry| entry.is_expired(Instant::now(), expiry));
        None
    }

    /// Inserts `id` unless a live entry for `ctx` already exists.
    pub fn put(&self, ctx: ContextId, id: impl Into<String>) {
        let now = Instant::now();
        match self.inner.entries.entry(ctx) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now, self.inner.expiry) {
                    occupied.insert(CorrelationEntry::new(id.into(), now));
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CorrelationEntry::new(id.into(), now));
            }
        }
    }

    /// Inserts or overwrites the id for `ctx` and refreshes its window.
    pub fn replace(&self, ctx: ContextId, id: impl Into<String>) {
        self.inner
            .entries
            .insert(ctx, CorrelationEntry::new(id.into(), Instant::now()));
    }

    /// Removes the entry for `ctx`, returning its id if it was still live.
    pub fn remove(&self, ctx: ContextId) -> Option<String> {
        let now = Instant::now();
        self.inner
            .entries
            .remove(&ctx)
            .and_then(|(_, entry)| (!entry.is_expired(now, self.inner.expiry)).then_some(entry.value))
    }

    /// Returns `true` if a live entry exists. Does not refresh the window.
    pub fn contains(&self, ctx: ContextId) -> bool {
        let now = Instant::now();
        self.inner
            .entries
            .get(&ctx)
            .is_some_and(|entry| !entry.is_expired(now, self.inner.expiry))
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    /// Number of live entries. Approximate under concurrent mutation.
    pub fn count(&self) -> usize {
        self.inner.sweep();
        self.inner.entries.len()
    }

    /// Removes expired entries and returns how many were dropped.
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    /// Starts a background thread that sweeps every `interval`.
    ///
    /// The thread stops when the returned handle is dropped or when every
    /// clone of the cache has been dropped.
    pub fn start_sweeper(&self, interval: Duration) -> Sweeper {
        let (stop, stopped) = mpsc::channel::<()>();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let logger = self.inner.logger.clone();

        let spawned = thread::Builder::new()
            .name("enrichlog-sweeper".to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let Some(inner) = weak.upgrade() else {
                            break;
                        };
                        let removed = inner.sweep();
                        if removed > 0 {
                            debug!(inner.logger, "swept expired correlation entries";
                                "removed" => removed,
                                "interval_ms" => interval.as_millis() as u64);
                        }
                    }
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(logger, "correlation sweeper could not be started"; "error" => %err);
                None
            }
        };

        Sweeper {
            stop: Some(stop),
            handle,
        }
    }
}

/// Handle to a background sweeper thread. Dropping it stops and joins the
/// thread.
#[must_use = "the sweeper stops when the handle is dropped"]
#[derive(Debug)]
pub struct Sweeper {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Sweeper {
    /// Returns `true` if the background thread was started.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::{ContextId, CorrelationCache};

    const SHORT_EXPIRY: Duration = Duration::from_millis(60);

    #[test]
    fn put_is_insert_if_absent() {
        let cache = CorrelationCache::new(600);
        let ctx = ContextId::new();
        cache.put(ctx, "a");
        cache.put(ctx, "b");
        assert_eq!(cache.get(ctx).as_deref(), Some("a"));
    }

    #[test]
    fn replace_overwrites() {
        let cache = CorrelationCache::new(600);
        let ctx = ContextId::new();
        cache.put(ctx, "a");
        cache.replace(ctx, "b");
        assert_eq!(cache.get(ctx).as_deref(), Some("b"));
    }

    #[test]
    fn absent_keys_are_not_errors() {
        let cache = CorrelationCache::default();
        let ctx = ContextId::new();
        assert_eq!(cache.get(ctx), None);
        assert_eq!(cache.remove(ctx), None);
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn untouched_entry_expires() {
        let cache = CorrelationCache::with_expiry(SHORT_EXPIRY);
        let ctx = ContextId::new();
        cache.put(ctx, "a");
        thread::sleep(SHORT_EXPIRY * 3);
        assert!(!cache.contains(ctx));
        assert_eq!(cache.get(ctx), None);
        assert!(cache.inner.entries.is_empty());
    }

    #[test]
    fn expired_entry_counts_as_absent_for_put() {
        let cache = CorrelationCache::with_expiry(SHORT_EXPIRY);
        let ctx = ContextId::new();
        cache.put(ctx, "old");
        thread::sleep(SHORT_EXPIRY * 3);
        cache.put(ctx, "new");
        assert_eq!(cache.get(ctx).as_deref(), Some("new"));
    }

    #[test]
    fn contains_does_not_refresh() {
        let cache = CorrelationCache::with_expiry(Duration::from_millis(150));
        let ctx = ContextId::new();
        cache.put(ctx, "a");
        for _ in 0..4 {
            thread::sleep(Duration::from_millis(50));
            let _ = cache.contains(ctx);
        }
        assert_eq!(cache.get(ctx), None);
    }

    #[test]
    fn sweep_reports_removed_entries() {
        let cache = CorrelationCache::with_expiry(SHORT_EXPIRY);
        cache.put(ContextId::new(), "a");
        cache.put(ContextId::new(), "b");
        thread::sleep(SHORT_EXPIRY * 3);
        let live = ContextId::new();
        cache.put(live, "c");
        assert_eq!(cache.sweep(), 2);
        assert_eq!(cache.count(), 1);
    }

    #[test]
    fn sweeper_thread_evicts_and_stops_on_drop() {
        let cache = CorrelationCache::with_expiry(SHORT_EXPIRY);
        cache.put(ContextId::new(), "a");
        let sweeper = cache.start_sweeper(Duration::from_millis(20));
        assert!(sweeper.is_running());
        thread::sleep(SHORT_EXPIRY * 4);
        assert!(cache.inner.entries.is_empty());
        drop(sweeper);
    }

    #[test]
    fn concurrent_contexts_keep_their_own_ids() {
        let cache = CorrelationCache::new(600);
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let cache = cache.clone();
                thread::spawn(move || {
                    let ctx = ContextId::current();
                    let id = format!("id-{n}");
                    for _ in 0..100 {
                        cache.replace(ctx, id.clone());
                        assert_eq!(cache.get(ctx), Some(id.clone()));
                    }
                    ctx
                })
            })
            .collect();
        let contexts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(cache.count(), contexts.len());
        assert_eq!(Arc::strong_count(&cache.inner), 1);
    }
}
