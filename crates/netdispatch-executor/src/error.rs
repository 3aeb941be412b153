use thiserror::Error;

use netdispatch_capacity::CapacityError;
use netdispatch_queue::QueueError;
use netdispatch_ratelimiter::RateLimiterError;

/// Errors raised by [`crate::Executor`] construction, lifecycle, and
/// submission.
#[derive(Debug, Error, Clone)]
pub enum ExecutorError {
    #[error("executor is not running")]
    NotRunning,

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error(transparent)]
    RateLimiter(#[from] RateLimiterError),
}

impl ExecutorError {
    pub fn is_not_running(&self) -> bool {
        matches!(self, ExecutorError::NotRunning)
    }
}
