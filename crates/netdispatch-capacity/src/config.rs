use std::time::Duration;

use netdispatch_core::{EventListeners, FnListener};

use crate::events::CapacityEvent;

/// Configuration for a [`crate::CapacityLimiter`].
pub struct CapacityConfig {
    pub(crate) name: String,
    pub(crate) max_concurrent_calls: usize,
    pub(crate) max_wait_duration: Option<Duration>,
    pub(crate) event_listeners: EventListeners<CapacityEvent>,
}

impl CapacityConfig {
    pub fn builder() -> CapacityConfigBuilder {
        CapacityConfigBuilder::default()
    }
}

/// Builder for [`CapacityConfig`].
pub struct CapacityConfigBuilder {
    name: String,
    max_concurrent_calls: usize,
    max_wait_duration: Option<Duration>,
    event_listeners: EventListeners<CapacityEvent>,
}

impl Default for CapacityConfigBuilder {
    fn default() -> Self {
        Self {
            name: "capacity-limiter".to_string(),
            max_concurrent_calls: 25,
            max_wait_duration: None,
            event_listeners: EventListeners::new(),
        }
    }
}

impl CapacityConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Maximum number of calls allowed to run concurrently. Must be > 0.
    pub fn max_concurrent_calls(mut self, max_concurrent_calls: usize) -> Self {
        self.max_concurrent_calls = max_concurrent_calls;
        self
    }

    /// How long a caller waits for a free permit before being rejected.
    /// `None` (the default) means wait indefinitely.
    pub fn max_wait_duration(mut self, max_wait_duration: Duration) -> Self {
        self.max_wait_duration = Some(max_wait_duration);
        self
    }

    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(&CapacityEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&CapacityEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    pub fn on_call_finished<F>(mut self, f: F) -> Self
    where
        F: Fn(&CapacityEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    pub fn on_call_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&CapacityEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    pub fn build(self) -> CapacityConfig {
        CapacityConfig {
            name: self.name,
            max_concurrent_calls: self.max_concurrent_calls,
            max_wait_duration: self.max_wait_duration,
            event_listeners: self.event_listeners,
        }
    }
}
