use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use netdispatch_core::{EventListeners, FnListener};

use crate::events::CircuitBreakerEvent;
use crate::SharedFailureClassifier;

/// The representable knobs of a [`CircuitBreakerConfig`], with the failure
/// classifier and listener callbacks stripped out, so a breaker's tuning can
/// round-trip through `serde_json` (the full config is generic over `Res`
/// and `Err` and holds `Arc<dyn Fn>` fields that cannot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: usize,
    pub recovery_time: Duration,
    pub half_open_max_calls: usize,
    pub name: String,
}

/// Configuration for a [`crate::CircuitBreaker`], per §4.6: a consecutive-
/// failure counter rather than a sliding-window failure rate, plus an
/// exclude predicate for error kinds that should propagate without tripping
/// the breaker.
pub struct CircuitBreakerConfig<Res, Err> {
    pub(crate) failure_threshold: usize,
    pub(crate) recovery_time: Duration,
    pub(crate) half_open_max_calls: usize,
    pub(crate) failure_classifier: SharedFailureClassifier<Res, Err>,
    pub(crate) exclude_predicate: Option<Arc<dyn Fn(&Err) -> bool + Send + Sync>>,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
    pub(crate) name: String,
}

impl<Res, Err> CircuitBreakerConfig<Res, Err> {
    pub fn builder() -> CircuitBreakerConfigBuilder<Res, Err> {
        CircuitBreakerConfigBuilder::new()
    }

    /// The representable knobs, with the failure classifier and listener
    /// callbacks stripped out.
    pub fn settings(&self) -> CircuitBreakerSettings {
        CircuitBreakerSettings {
            failure_threshold: self.failure_threshold,
            recovery_time: self.recovery_time,
            half_open_max_calls: self.half_open_max_calls,
            name: self.name.clone(),
        }
    }
}

pub struct CircuitBreakerConfigBuilder<Res, Err> {
    failure_threshold: usize,
    recovery_time: Duration,
    half_open_max_calls: usize,
    failure_classifier: SharedFailureClassifier<Res, Err>,
    exclude_predicate: Option<Arc<dyn Fn(&Err) -> bool + Send + Sync>>,
    event_listeners: EventListeners<CircuitBreakerEvent>,
    name: String,
}

impl<Res, Err> CircuitBreakerConfigBuilder<Res, Err> {
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            recovery_time: Duration::from_secs(30),
            half_open_max_calls: 1,
            failure_classifier: Arc::new(|res| res.is_err()),
            exclude_predicate: None,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Consecutive failures that trip the circuit from `Closed` to `Open`.
    ///
    /// Default: 5
    pub fn failure_threshold(mut self, n: usize) -> Self {
        self.failure_threshold = n;
        self
    }

    /// How long the circuit stays `Open` before admitting a probe call in
    /// `HalfOpen`.
    ///
    /// Default: 30 seconds
    pub fn recovery_time(mut self, duration: Duration) -> Self {
        self.recovery_time = duration;
        self
    }

    /// Maximum concurrent calls admitted while `HalfOpen`.
    ///
    /// Default: 1
    pub fn half_open_max_calls(mut self, n: usize) -> Self {
        self.half_open_max_calls = n;
        self
    }

    /// Custom failure classifier. Default: every `Err(_)` is a failure.
    pub fn failure_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&Result<Res, Err>) -> bool + Send + Sync + 'static,
    {
        self.failure_classifier = Arc::new(classifier);
        self
    }

    /// Errors the predicate accepts propagate to the caller unchanged but
    /// count toward neither success nor failure: `consecutive_failures` is
    /// left untouched and a `HalfOpen` probe is neither closed nor reopened.
    /// Checked before [`Self::failure_classifier`].
    pub fn exclude_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Err) -> bool + Send + Sync + 'static,
    {
        self.exclude_predicate = Some(Arc::new(predicate));
        self
    }

    /// Give this breaker a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState, crate::CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::StateTransition { from_state, to_state, .. } = event {
                f(*from_state, *to_state);
            }
        }));
        self
    }

    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::CallPermitted { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CircuitBreakerEvent| {
            if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                f();
            }
        }));
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::SuccessRecorded { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState, usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::FailureRecorded { state, consecutive_failures, .. } = event {
                f(*state, *consecutive_failures);
            }
        }));
        self
    }

    pub fn build(self) -> CircuitBreakerConfig<Res, Err> {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_time: self.recovery_time,
            half_open_max_calls: self.half_open_max_calls,
            failure_classifier: self.failure_classifier,
            exclude_predicate: self.exclude_predicate,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl<Res, Err> Default for CircuitBreakerConfigBuilder<Res, Err> {
    fn default() -> Self {
        Self::new()
    }
}
