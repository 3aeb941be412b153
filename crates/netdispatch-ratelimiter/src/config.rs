use std::time::Duration;

use serde::{Deserialize, Serialize};

use netdispatch_core::EventListeners;

use crate::events::RateLimiterEvent;

/// The representable knobs of a [`RateLimiterConfig`], with the listener
/// callbacks stripped out, so a limiter's tuning can round-trip through
/// `serde_json` (the full config holds `Fn` closures that cannot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimiterSettings {
    pub capacity: f64,
    pub rate: f64,
    pub period: Duration,
    pub name: String,
}

/// Builder-configured parameters for a [`crate::TokenBucket`].
///
/// Mirrors the teacher's `XConfigBuilder` pattern: defaults are set in
/// `new`, every knob has a fluent setter, and `build()` hands back the
/// finished limiter.
pub struct RateLimiterConfig {
    pub(crate) capacity: f64,
    pub(crate) rate: f64,
    pub(crate) period: Duration,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
    pub(crate) name: String,
}

impl RateLimiterConfig {
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }

    /// The representable knobs, with listener callbacks stripped out.
    pub fn settings(&self) -> RateLimiterSettings {
        RateLimiterSettings {
            capacity: self.capacity,
            rate: self.rate,
            period: self.period,
            name: self.name.clone(),
        }
    }
}

pub struct RateLimiterConfigBuilder {
    capacity: f64,
    rate: f64,
    period: Duration,
    event_listeners: EventListeners<RateLimiterEvent>,
    name: String,
}

impl RateLimiterConfigBuilder {
    pub fn new() -> Self {
        Self {
            capacity: 10.0,
            rate: 10.0,
            period: Duration::from_secs(1),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Maximum accumulated credit. Default: 10.
    pub fn capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Tokens regained per `period`. Default: 10.
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Refill period. Default: 1 second.
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Convenience for `rate` requests per second with a matching bucket
    /// capacity, the common case for request-count limiting.
    pub fn requests_per_second(mut self, rps: f64) -> Self {
        self.rate = rps;
        self.period = Duration::from_secs(1);
        self.capacity = rps;
        self
    }

    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_wait<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        use netdispatch_core::FnListener;
        self.event_listeners.add(FnListener::new(move |event: &RateLimiterEvent| {
            if let RateLimiterEvent::Waited { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    pub fn build(self) -> RateLimiterConfig {
        RateLimiterConfig {
            capacity: self.capacity,
            rate: self.rate,
            period: self.period,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_serde_json_without_loss() {
        let config = RateLimiterConfig::builder().capacity(42.0).rate(7.0).period(Duration::from_millis(250)).name("orders-api").build();

        let settings = config.settings();
        let json = serde_json::to_string(&settings).unwrap();
        let restored: RateLimiterSettings = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, settings);
    }
}
