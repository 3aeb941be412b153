use std::time::{Duration, Instant};
use netdispatch_core::DispatchEvent;

/// Observability events raised while retrying an operation.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// A retry attempt is about to be made, after `delay`.
    Retry {
        name: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    /// The operation succeeded, whether on the first try or after retries.
    Success {
        name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The operation failed after exhausting all retry attempts.
    Error {
        name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// An error was returned but not retried, per the retry predicate.
    IgnoredError { name: String, timestamp: Instant },
}

impl DispatchEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Error { .. } => "error",
            RetryEvent::IgnoredError { .. } => "ignored_error",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Error { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            RetryEvent::Retry { name, .. }
            | RetryEvent::Success { name, .. }
            | RetryEvent::Error { name, .. }
            | RetryEvent::IgnoredError { name, .. } => name,
        }
    }
}
