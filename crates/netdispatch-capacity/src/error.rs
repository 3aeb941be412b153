use thiserror::Error;

/// Errors raised by the capacity limiter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CapacityError {
    #[error("capacity limiter max_concurrent_calls must be > 0, got {0}")]
    InvalidMaxConcurrentCalls(usize),

    #[error("capacity limiter rejected the call: all {0} permits are in use")]
    Rejected(usize),

    #[error("capacity limiter timed out waiting for a permit after {0:?}")]
    TimedOut(std::time::Duration),
}
