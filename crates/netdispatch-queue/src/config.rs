use netdispatch_core::EventListeners;

use crate::events::QueueEvent;

/// Configuration for a [`crate::BoundedWorkQueue`].
pub struct QueueConfig {
    pub(crate) capacity: usize,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<QueueEvent>,
}

impl QueueConfig {
    pub fn builder() -> QueueConfigBuilder {
        QueueConfigBuilder::new()
    }
}

pub struct QueueConfigBuilder {
    capacity: usize,
    name: String,
    event_listeners: EventListeners<QueueEvent>,
}

impl QueueConfigBuilder {
    /// Default capacity: 100.
    pub fn new() -> Self {
        Self {
            capacity: 100,
            name: String::from("<unnamed>"),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_enqueued<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(netdispatch_core::FnListener::new(move |event: &QueueEvent| {
            if let QueueEvent::Enqueued { size, .. } = event {
                f(*size);
            }
        }));
        self
    }

    pub fn on_backpressure<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(netdispatch_core::FnListener::new(move |event: &QueueEvent| {
            if matches!(event, QueueEvent::Backpressure { .. }) {
                f();
            }
        }));
        self
    }

    pub fn build(self) -> Result<QueueConfig, crate::QueueError> {
        if self.capacity == 0 {
            return Err(crate::QueueError::InvalidCapacity);
        }
        Ok(QueueConfig {
            capacity: self.capacity,
            name: self.name,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for QueueConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        let result = QueueConfig::builder().capacity(0).build();
        match result {
            Err(err) => assert_eq!(err, crate::QueueError::InvalidCapacity),
            Ok(_) => panic!("expected zero capacity to be rejected"),
        }
    }

    #[test]
    fn default_capacity_is_one_hundred() {
        let config = QueueConfig::builder().build().unwrap();
        assert_eq!(config.capacity, 100);
    }
}
