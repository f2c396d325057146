//! Execution context handles.
//!
//! A [`ContextId`] names the logical unit of work a log call belongs to. Every
//! OS thread lazily receives its own handle; callers running several logical
//! operations on one thread (or moving work between threads) allocate explicit
//! handles and either pass them directly or enter them as a scope.

use std::{
    cell::{Cell, RefCell},
    fmt,
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_CONTEXT: Cell<Option<ContextId>> = const { Cell::new(None) };
    static SCOPE_STACK: RefCell<Vec<ContextId>> = const { RefCell::new(Vec::new()) };
}

/// Opaque, process-unique execution context handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocates a fresh handle.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Handle of the innermost entered scope on this thread, or the thread's
    /// own handle when no scope is active.
    pub fn current() -> Self {
        if let Some(scoped) = SCOPE_STACK.with(|stack| stack.borrow().last().copied()) {
            return scoped;
        }
        THREAD_CONTEXT.with(|cell| match cell.get() {
            Some(id) => id,
            None => {
                let id = Self::new();
                cell.set(Some(id));
                id
            }
        })
    }

    /// Makes this handle the current context on this thread until the guard
    /// is dropped. Scopes nest.
    pub fn enter(self) -> ContextScope {
        SCOPE_STACK.with(|stack| stack.borrow_mut().push(self));
        ContextScope {
            id: self,
            _not_send: PhantomData,
        }
    }

    /// Raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// Guard returned by [`ContextId::enter`].
///
/// Must be dropped on the thread that created it.
#[must_use = "the scope ends when the guard is dropped"]
#[derive(Debug)]
pub struct ContextScope {
    id: ContextId,
    _not_send: PhantomData<*const ()>,
}

impl ContextScope {
    /// Handle this scope made current.
    pub fn id(&self) -> ContextId {
        self.id
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(position) = stack.iter().rposition(|id| *id == self.id) {
                stack.remove(position);
            }
        });
    }
}
