use std::time::{Duration, Instant};

use netdispatch_core::DispatchEvent;

/// Observability events raised by a capacity limiter.
#[derive(Debug, Clone)]
pub enum CapacityEvent {
    /// A call was admitted immediately or after waiting for a permit.
    Permitted { name: String, timestamp: Instant },
    /// A call was rejected because no permit became available within
    /// `max_wait_duration`.
    Rejected { name: String, timestamp: Instant },
    /// A permitted call finished (successfully or not); `duration` is the
    /// time the permit was held.
    Finished {
        name: String,
        duration: Duration,
        timestamp: Instant,
    },
    /// A permitted call's future resolved to an error, per the configured
    /// failure classifier.
    Failed {
        name: String,
        duration: Duration,
        timestamp: Instant,
    },
}

impl DispatchEvent for CapacityEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CapacityEvent::Permitted { .. } => "permitted",
            CapacityEvent::Rejected { .. } => "rejected",
            CapacityEvent::Finished { .. } => "finished",
            CapacityEvent::Failed { .. } => "failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CapacityEvent::Permitted { timestamp, .. } => *timestamp,
            CapacityEvent::Rejected { timestamp, .. } => *timestamp,
            CapacityEvent::Finished { timestamp, .. } => *timestamp,
            CapacityEvent::Failed { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            CapacityEvent::Permitted { name, .. } => name,
            CapacityEvent::Rejected { name, .. } => name,
            CapacityEvent::Finished { name, .. } => name,
            CapacityEvent::Failed { name, .. } => name,
        }
    }
}
