use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;

/// The three states a circuit breaker can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: std::sync::Arc<AtomicU8>,
    last_state_change: Instant,
    consecutive_failures: usize,
    half_open_in_flight: usize,
}

impl Circuit {
    pub(crate) fn new_with_atomic(state_atomic: std::sync::Arc<AtomicU8>) -> Self {
        Self {
            state: CircuitState::Closed,
            state_atomic,
            last_state_change: Instant::now(),
            consecutive_failures: 0,
            half_open_in_flight: 0,
        }
    }

    #[cfg(test)]
    pub fn new() -> Self {
        Self::new_with_atomic(std::sync::Arc::new(AtomicU8::new(CircuitState::Closed as u8)))
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Decides whether a call may proceed, transitioning `Open` to
    /// `HalfOpen` when `recovery_time` has elapsed. In `HalfOpen`, admits at
    /// most `half_open_max_calls` concurrently.
    pub fn try_acquire(&mut self, config: &CircuitBreakerConfig<impl Sized, impl Sized>) -> bool {
        match self.state {
            CircuitState::Closed => {
                self.emit_permitted(config);
                true
            }
            CircuitState::Open => {
                if self.last_state_change.elapsed() >= config.recovery_time {
                    self.transition_to(CircuitState::HalfOpen, config);
                    self.half_open_in_flight += 1;
                    self.emit_permitted(config);
                    true
                } else {
                    self.emit_rejected(config);
                    false
                }
            }
            CircuitState::HalfOpen => {
                if self.half_open_in_flight < config.half_open_max_calls {
                    self.half_open_in_flight += 1;
                    self.emit_permitted(config);
                    true
                } else {
                    self.emit_rejected(config);
                    false
                }
            }
        }
    }

    /// A single success in `HalfOpen` closes the circuit and resets all
    /// counters; in `Closed`, resets the consecutive-failure counter.
    pub fn record_success(&mut self, config: &CircuitBreakerConfig<impl Sized, impl Sized>) {
        config.event_listeners.emit(&CircuitBreakerEvent::SuccessRecorded {
            name: config.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
        });

        #[cfg(feature = "metrics")]
        metrics::counter!("netdispatch_circuitbreaker_calls_total", "breaker" => config.name.clone(), "outcome" => "success").increment(1);

        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_in_flight = self.half_open_in_flight.saturating_sub(1);
                self.transition_to(CircuitState::Closed, config);
            }
            _ => {
                self.consecutive_failures = 0;
            }
        }
    }

    /// A single failure in `HalfOpen` reopens the circuit. In `Closed`,
    /// failures accumulate until `failure_threshold` trips the circuit.
    pub fn record_failure(&mut self, config: &CircuitBreakerConfig<impl Sized, impl Sized>) {
        self.consecutive_failures += 1;

        config.event_listeners.emit(&CircuitBreakerEvent::FailureRecorded {
            name: config.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
            consecutive_failures: self.consecutive_failures,
        });

        #[cfg(feature = "metrics")]
        metrics::counter!("netdispatch_circuitbreaker_calls_total", "breaker" => config.name.clone(), "outcome" => "failure").increment(1);

        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_in_flight = self.half_open_in_flight.saturating_sub(1);
                self.transition_to(CircuitState::Open, config);
            }
            CircuitState::Closed => {
                if self.consecutive_failures >= config.failure_threshold {
                    self.transition_to(CircuitState::Open, config);
                }
            }
            CircuitState::Open => {}
        }
    }

    /// An excluded error: propagates to the caller but touches neither the
    /// consecutive-failure counter nor the state machine, beyond releasing
    /// its `HalfOpen` probe slot.
    pub fn record_excluded(&mut self, config: &CircuitBreakerConfig<impl Sized, impl Sized>) {
        config.event_listeners.emit(&CircuitBreakerEvent::ExcludedRecorded {
            name: config.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
        });

        #[cfg(feature = "metrics")]
        metrics::counter!("netdispatch_circuitbreaker_calls_total", "breaker" => config.name.clone(), "outcome" => "excluded").increment(1);

        if self.state == CircuitState::HalfOpen {
            self.half_open_in_flight = self.half_open_in_flight.saturating_sub(1);
        }
    }

    pub fn force_open(&mut self, config: &CircuitBreakerConfig<impl Sized, impl Sized>) {
        self.transition_to(CircuitState::Open, config);
    }

    pub fn force_closed(&mut self, config: &CircuitBreakerConfig<impl Sized, impl Sized>) {
        self.transition_to(CircuitState::Closed, config);
    }

    pub fn reset(&mut self, config: &CircuitBreakerConfig<impl Sized, impl Sized>) {
        self.transition_to(CircuitState::Closed, config);
    }

    fn emit_permitted(&self, config: &CircuitBreakerConfig<impl Sized, impl Sized>) {
        config.event_listeners.emit(&CircuitBreakerEvent::CallPermitted {
            name: config.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
        });
    }

    fn emit_rejected(&self, config: &CircuitBreakerConfig<impl Sized, impl Sized>) {
        config.event_listeners.emit(&CircuitBreakerEvent::CallRejected {
            name: config.name.clone(),
            timestamp: Instant::now(),
        });
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig<impl Sized, impl Sized>) {
        if self.state == state {
            return;
        }
        let from_state = self.state;

        config.event_listeners.emit(&CircuitBreakerEvent::StateTransition {
            name: config.name.clone(),
            timestamp: Instant::now(),
            from_state,
            to_state: state,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = config.name, from = ?from_state, to = ?state, "circuit breaker state transition");

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.last_state_change = Instant::now();
        self.consecutive_failures = 0;
        self.half_open_in_flight = 0;
    }
}
