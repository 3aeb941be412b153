//! Token-bucket and adaptive rate limiting.
//!
//! [`TokenBucket`] is the low-level primitive; [`RateLimiter`] pairs it
//! with a name and event listeners; [`RateLimiterRegistry`] hands out a
//! `RateLimiter` per endpoint key; [`AdaptiveRateLimiter`] reparameterizes
//! a `RateLimiter` from response headers.

mod adaptive;
mod config;
mod error;
mod events;
mod limiter;
mod named;
mod registry;

pub use adaptive::AdaptiveRateLimiter;
pub use config::{RateLimiterConfig, RateLimiterConfigBuilder, RateLimiterSettings};
pub use error::RateLimiterError;
pub use events::RateLimiterEvent;
pub use limiter::TokenBucket;
pub use named::RateLimiter;
pub use registry::RateLimiterRegistry;
