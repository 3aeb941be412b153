use thiserror::Error;

/// Errors raised by [`crate::BoundedWorkQueue`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueueError {
    #[error("queue capacity must be > 0")]
    InvalidCapacity,

    #[error("start_workers requires at least 1 worker, got {0}")]
    InvalidWorkerCount(usize),

    #[error("queue is not processing (status is {0:?})")]
    NotRunning(crate::QueueStatus),

    #[error("queue has been closed")]
    Closed,
}
