//! Consecutive-failure circuit breaker, per §4.6.
//!
//! ## States
//! - **Closed**: calls pass through; consecutive failures accumulate.
//! - **Open**: calls are rejected immediately until `recovery_time` elapses.
//! - **HalfOpen**: a bounded number of probe calls are admitted; one success
//!   closes the circuit, one failure reopens it.
//!
//! ```rust
//! use netdispatch_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let config = CircuitBreakerConfig::<&'static str, &'static str>::builder()
//!     .failure_threshold(2)
//!     .recovery_time(Duration::from_millis(200))
//!     .build();
//! let breaker = CircuitBreaker::new(config);
//!
//! let result = breaker.execute(|| async { Ok::<_, &'static str>("ok") }).await;
//! # }
//! ```

use std::sync::atomic::AtomicU8;
use std::sync::Arc;
use std::future::Future;

use tokio::sync::Mutex;

pub use circuit::CircuitState;
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerSettings};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;

mod circuit;
mod classifier;
mod config;
mod error;
mod events;

pub use classifier::{DefaultClassifier, FailureClassifier, FnClassifier};

use circuit::Circuit;

pub(crate) type SharedFailureClassifier<Res, Err> = Arc<dyn Fn(&Result<Res, Err>) -> bool + Send + Sync>;

/// Wraps an async closure with consecutive-failure circuit breaking.
pub struct CircuitBreaker<Res, Err> {
    circuit: Arc<Mutex<Circuit>>,
    state_atomic: Arc<AtomicU8>,
    config: Arc<CircuitBreakerConfig<Res, Err>>,
}

impl<Res, Err> Clone for CircuitBreaker<Res, Err> {
    fn clone(&self) -> Self {
        Self {
            circuit: Arc::clone(&self.circuit),
            state_atomic: Arc::clone(&self.state_atomic),
            config: Arc::clone(&self.config),
        }
    }
}

impl<Res, Err> CircuitBreaker<Res, Err> {
    pub fn new(config: CircuitBreakerConfig<Res, Err>) -> Self {
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            circuit: Arc::new(Mutex::new(Circuit::new_with_atomic(Arc::clone(&state_atomic)))),
            state_atomic,
            config: Arc::new(config),
        }
    }

    pub async fn force_open(&self) {
        self.circuit.lock().await.force_open(&self.config);
    }

    pub async fn force_closed(&self) {
        self.circuit.lock().await.force_closed(&self.config);
    }

    pub async fn reset(&self) {
        self.circuit.lock().await.reset(&self.config);
    }

    pub async fn state(&self) -> CircuitState {
        self.circuit.lock().await.state()
    }

    /// Reads the circuit's state without an async lock, safe for metrics
    /// collection or health-check endpoints.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(std::sync::atomic::Ordering::Acquire))
    }

    /// Runs `fut` if the circuit permits it, recording the outcome per the
    /// configured failure classifier. Returns
    /// [`CircuitBreakerError::OpenCircuit`] without invoking `fut` if the
    /// circuit is open.
    pub async fn execute<F, Fut>(&self, fut: F) -> Result<Res, CircuitBreakerError<Err>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Res, Err>>,
    {
        let permitted = {
            let mut circuit = self.circuit.lock().await;
            circuit.try_acquire(&self.config)
        };

        if !permitted {
            return Err(CircuitBreakerError::OpenCircuit);
        }

        let result = fut().await;

        let mut circuit = self.circuit.lock().await;
        let excluded = match (&result, &self.config.exclude_predicate) {
            (Err(error), Some(exclude)) => exclude(error),
            _ => false,
        };
        if excluded {
            circuit.record_excluded(&self.config);
        } else if (self.config.failure_classifier)(&result) {
            circuit.record_failure(&self.config);
        } else {
            circuit.record_success(&self.config);
        }
        drop(circuit);

        result.map_err(CircuitBreakerError::Inner)
    }
}
