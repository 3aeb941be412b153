use std::time::{Duration, Instant};

use netdispatch_core::DispatchEvent;

/// Observability events raised by a rate limiter.
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A caller had to wait `duration` before its cost was earned.
    Waited {
        name: String,
        cost: f64,
        duration: Duration,
        timestamp: Instant,
    },
    /// The limiter's rate/capacity was reparameterized, e.g. from response
    /// headers via the adaptive limiter.
    Reparameterized {
        name: String,
        new_rate: f64,
        timestamp: Instant,
    },
}

impl DispatchEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::Waited { .. } => "waited",
            RateLimiterEvent::Reparameterized { .. } => "reparameterized",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::Waited { timestamp, .. } => *timestamp,
            RateLimiterEvent::Reparameterized { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            RateLimiterEvent::Waited { name, .. } => name,
            RateLimiterEvent::Reparameterized { name, .. } => name,
        }
    }
}
