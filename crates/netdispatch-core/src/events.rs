//! Event system for dispatch-pipeline observability.
//!
//! The rate limiter, circuit breaker and retry policy each define their own
//! event enum and emit it through an [`EventListeners`] collection, so a
//! caller can attach logging, metrics, or test probes without the pipeline
//! component needing to know about any of them.

#[cfg(feature = "tracing")]
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An observable event raised by a dispatch-pipeline component.
pub trait DispatchEvent: Send + Sync + fmt::Debug {
    /// Short machine-readable event kind, e.g. `"state_transition"`.
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn timestamp(&self) -> Instant;

    /// Name of the component instance that raised it.
    fn component_name(&self) -> &str;
}

/// Receives events raised by a dispatch-pipeline component.
pub trait EventListener<E: DispatchEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// A collection of event listeners for one component instance.
#[derive(Clone)]
pub struct EventListeners<E: DispatchEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: DispatchEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Emits an event to every registered listener.
    ///
    /// A panicking listener is caught so the rest still run; with the
    /// `tracing` feature the panic is logged, with `metrics` it is counted.
    pub fn emit(&self, event: &E) {
        for (index, listener) in self.listeners.iter().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));

            if let Err(_panic_payload) = result {
                #[cfg(feature = "tracing")]
                log_listener_panic(index, event, _panic_payload.as_ref());

                #[cfg(feature = "metrics")]
                record_listener_panic_metric(event);

                #[cfg(not(feature = "tracing"))]
                let _ = index;

                #[cfg(not(any(feature = "tracing", feature = "metrics")))]
                let _ = _panic_payload;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: DispatchEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A closure-based [`EventListener`].
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _phantom: std::marker::PhantomData<E>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: DispatchEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}

#[cfg(feature = "tracing")]
fn log_listener_panic<E: DispatchEvent>(index: usize, event: &E, panic_payload: &(dyn Any + Send)) {
    let panic_message = panic_payload
        .downcast_ref::<&'static str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic_payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());

    tracing::warn!(
        listener_index = index,
        component = event.component_name(),
        event_type = event.event_type(),
        panic_message = %panic_message,
        "dispatch event listener panicked"
    );
}

#[cfg(feature = "metrics")]
fn record_listener_panic_metric<E: DispatchEvent>(event: &E) {
    let component_label = event.component_name().to_string();
    let event_type_label = event.event_type().to_string();

    metrics::counter!(
        "netdispatch_event_listener_panics_total",
        "component" => component_label,
        "event_type" => event_type_label
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestEvent {
        name: String,
        timestamp: Instant,
    }

    impl DispatchEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            "test"
        }

        fn timestamp(&self) -> Instant {
            self.timestamp
        }

        fn component_name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn listeners_are_called_on_every_emit() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut listeners = EventListeners::new();
        listeners.add(FnListener::new(move |_event: &TestEvent| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let event = TestEvent {
            name: "test".to_string(),
            timestamp: Instant::now(),
        };

        listeners.emit(&event);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        listeners.emit(&event);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn a_panicking_listener_does_not_block_the_others() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut listeners = EventListeners::new();
        listeners.add(FnListener::new(|_: &TestEvent| panic!("boom")));
        listeners.add(FnListener::new(move |_: &TestEvent| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let event = TestEvent {
            name: "test".to_string(),
            timestamp: Instant::now(),
        };

        listeners.emit(&event);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
