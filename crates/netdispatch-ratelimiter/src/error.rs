use thiserror::Error;

/// Errors raised by the rate limiter family.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RateLimiterError {
    /// Construction-time validation failure: `rate` must be strictly positive.
    #[error("rate limiter rate must be > 0, got {0}")]
    InvalidRate(f64),

    /// Construction-time validation failure: `capacity` must be strictly positive.
    #[error("rate limiter capacity must be > 0, got {0}")]
    InvalidCapacity(f64),

    /// `update_rate_limit` targeted an endpoint key that has no registered
    /// limiter.
    #[error("no rate limiter registered for endpoint {0:?}")]
    UnknownEndpoint(String),
}
