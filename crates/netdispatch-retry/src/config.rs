use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use netdispatch_core::{EventListeners, FnListener};

use crate::backoff::{ExponentialBackoff, FixedInterval, IntervalFunction};
use crate::events::RetryEvent;
use crate::policy::{RetryPolicy, RetryPredicate};

/// The representable knobs of a [`RetryConfig`], with the backoff strategy,
/// predicates and listener callbacks stripped out, so a retrier's tuning can
/// round-trip through `serde_json` (the full config is generic over `E` and
/// holds `Arc<dyn Fn>`/`Arc<dyn IntervalFunction>` fields that cannot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_retries: usize,
    pub name: String,
}

/// Configuration for [`crate::Retrier`], per §4.7: a pure retry policy with
/// exponential (or custom) backoff and an optional exclude-set checked
/// before the retry-set.
pub struct RetryConfig<E> {
    pub(crate) policy: RetryPolicy<E>,
    pub(crate) exclude_predicate: Option<RetryPredicate<E>>,
    pub(crate) max_retries: usize,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

impl<E> RetryConfig<E> {
    pub fn builder() -> RetryConfigBuilder<E> {
        RetryConfigBuilder::new()
    }

    /// The representable knobs, with the backoff strategy, predicates and
    /// listener callbacks stripped out.
    pub fn settings(&self) -> RetrySettings {
        RetrySettings {
            max_retries: self.max_retries,
            name: self.name.clone(),
        }
    }
}

pub struct RetryConfigBuilder<E> {
    max_retries: usize,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    retry_predicate: Option<RetryPredicate<E>>,
    exclude_predicate: Option<RetryPredicate<E>>,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl<E> Default for RetryConfigBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryConfigBuilder<E> {
    /// Defaults: `max_retries` 3 (four attempts total), exponential backoff
    /// starting at 100ms, every error retried.
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            interval_fn: None,
            retry_predicate: None,
            exclude_predicate: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Maximum number of retries after the initial attempt; total attempts
    /// are `1 + max_retries`.
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn fixed_backoff(mut self, duration: Duration) -> Self {
        self.interval_fn = Some(Arc::new(FixedInterval::new(duration)));
        self
    }

    pub fn exponential_backoff(mut self, initial_interval: Duration) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialBackoff::new(initial_interval)));
        self
    }

    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Restricts retries to errors the predicate accepts. Checked only if
    /// the error does not match [`Self::exclude_on`] first.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Errors the predicate accepts propagate immediately, with no retry,
    /// regardless of [`Self::retry_on`].
    pub fn exclude_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.exclude_predicate = Some(Arc::new(predicate));
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// `Fn(attempt, delay)`; `attempt` is 1-indexed (first retry is 1).
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &RetryEvent| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// `Fn(attempts)`; `attempts` includes the initial attempt, so 1 means
    /// no retry was needed.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &RetryEvent| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &RetryEvent| {
            if let RetryEvent::Error { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &RetryEvent| {
            if matches!(event, RetryEvent::IgnoredError { .. }) {
                f();
            }
        }));
        self
    }

    pub fn build(self) -> RetryConfig<E> {
        let interval_fn = self
            .interval_fn
            .unwrap_or_else(|| Arc::new(ExponentialBackoff::new(Duration::from_millis(100))));

        let mut policy = RetryPolicy::new(interval_fn);
        if let Some(predicate) = self.retry_predicate {
            policy.retry_predicate = Some(predicate);
        }

        RetryConfig {
            policy,
            exclude_predicate: self.exclude_predicate,
            max_retries: self.max_retries,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}
