//! Bounded concurrency limiting for outbound API calls.
//!
//! [`CapacityLimiter`] wraps a `tokio::sync::Semaphore`, handing out a
//! [`CapacityGuard`] RAII permit per in-flight call and rejecting (or timing
//! out) callers once `max_concurrent_calls` is reached.

mod config;
mod error;
mod events;
mod limiter;

pub use config::{CapacityConfig, CapacityConfigBuilder};
pub use error::CapacityError;
pub use events::CapacityEvent;
pub use limiter::{CapacityGuard, CapacityLimiter};
