use std::time::Instant;

use netdispatch_core::DispatchEvent;

use crate::QueueStatus;

/// Observability events raised by a [`crate::BoundedWorkQueue`].
#[derive(Debug, Clone)]
pub enum QueueEvent {
    Enqueued { name: String, timestamp: Instant, size: usize },
    Processed { name: String, timestamp: Instant },
    Errored { name: String, timestamp: Instant },
    Backpressure { name: String, timestamp: Instant },
    StatusChanged { name: String, timestamp: Instant, from: QueueStatus, to: QueueStatus },
}

impl DispatchEvent for QueueEvent {
    fn event_type(&self) -> &'static str {
        match self {
            QueueEvent::Enqueued { .. } => "enqueued",
            QueueEvent::Processed { .. } => "processed",
            QueueEvent::Errored { .. } => "errored",
            QueueEvent::Backpressure { .. } => "backpressure",
            QueueEvent::StatusChanged { .. } => "status_changed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            QueueEvent::Enqueued { timestamp, .. }
            | QueueEvent::Processed { timestamp, .. }
            | QueueEvent::Errored { timestamp, .. }
            | QueueEvent::Backpressure { timestamp, .. }
            | QueueEvent::StatusChanged { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            QueueEvent::Enqueued { name, .. }
            | QueueEvent::Processed { name, .. }
            | QueueEvent::Errored { name, .. }
            | QueueEvent::Backpressure { name, .. }
            | QueueEvent::StatusChanged { name, .. } => name,
        }
    }
}
