//! Combines a backoff strategy with a predicate for which errors are worth retrying.

use std::sync::Arc;
use std::time::Duration;

use crate::backoff::IntervalFunction;

/// Decides whether a given error is retryable.
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

pub struct RetryPolicy<E> {
    pub(crate) interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) retry_predicate: Option<RetryPredicate<E>>,
}

impl<E> RetryPolicy<E> {
    pub fn new(interval_fn: Arc<dyn IntervalFunction>) -> Self {
        Self {
            interval_fn,
            retry_predicate: None,
        }
    }

    pub fn with_retry_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Retries every error unless a predicate was configured to narrow it.
    pub fn should_retry(&self, error: &E) -> bool {
        match &self.retry_predicate {
            Some(predicate) => predicate(error),
            None => true,
        }
    }

    pub fn next_backoff(&self, attempt: usize) -> Duration {
        self.interval_fn.next_interval(attempt)
    }
}
