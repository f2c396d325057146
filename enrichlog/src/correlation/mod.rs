//! Correlation ids per execution context.
//!
//! - **`context`**: [`ContextId`] handles and [`ContextScope`] guards.
//! - **`cache`**: the sliding-expiry [`CorrelationCache`].
//! - **`resolver`**: [`CorrelationResolver`], cached or static.

mod cache;
mod context;
mod resolver;

pub use cache::{CorrelationCache, Sweeper, DEFAULT_CORRELATION_EXPIRY_SECS};
pub use context::{ContextId, ContextScope};
pub use resolver::CorrelationResolver;
