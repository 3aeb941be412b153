use thiserror::Error;

/// Errors raised by a [`crate::CircuitBreaker`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CircuitBreakerError<E> {
    /// The circuit is `Open`; the wrapped call was never attempted.
    #[error("circuit breaker is open")]
    OpenCircuit,

    /// The wrapped call ran and returned an error.
    #[error(transparent)]
    Inner(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::OpenCircuit)
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            CircuitBreakerError::Inner(e) => Some(e),
            CircuitBreakerError::OpenCircuit => None,
        }
    }
}

impl<E> From<E> for CircuitBreakerError<E> {
    fn from(e: E) -> Self {
        CircuitBreakerError::Inner(e)
    }
}
