use std::time::Instant;

use netdispatch_core::DispatchEvent;

use crate::circuit::CircuitState;

/// Observability events raised by a [`crate::CircuitBreaker`].
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The circuit moved from one state to another.
    StateTransition {
        name: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    /// A call was allowed through in the given state.
    CallPermitted {
        name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call was rejected because the circuit is `Open`.
    CallRejected { name: String, timestamp: Instant },
    /// A permitted call succeeded, per the configured failure classifier.
    SuccessRecorded {
        name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A permitted call failed, per the configured failure classifier.
    FailureRecorded {
        name: String,
        timestamp: Instant,
        state: CircuitState,
        consecutive_failures: usize,
    },
    /// A permitted call's error matched the exclude predicate: it propagates
    /// to the caller but counts toward neither success nor failure.
    ExcludedRecorded {
        name: String,
        timestamp: Instant,
        state: CircuitState,
    },
}

impl DispatchEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
            CircuitBreakerEvent::ExcludedRecorded { .. } => "excluded_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. } => *timestamp,
            CircuitBreakerEvent::CallPermitted { timestamp, .. } => *timestamp,
            CircuitBreakerEvent::CallRejected { timestamp, .. } => *timestamp,
            CircuitBreakerEvent::SuccessRecorded { timestamp, .. } => *timestamp,
            CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
            CircuitBreakerEvent::ExcludedRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { name, .. } => name,
            CircuitBreakerEvent::CallPermitted { name, .. } => name,
            CircuitBreakerEvent::CallRejected { name, .. } => name,
            CircuitBreakerEvent::SuccessRecorded { name, .. } => name,
            CircuitBreakerEvent::FailureRecorded { name, .. } => name,
            CircuitBreakerEvent::ExcludedRecorded { name, .. } => name,
        }
    }
}
