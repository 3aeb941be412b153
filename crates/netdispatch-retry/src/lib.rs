//! Pure retry policy with configurable backoff, per §4.7.
//!
//! [`Retrier`] repeatedly invokes an async closure until it succeeds, the
//! error is excluded from retries, or `max_retries` is exhausted.
//!
//! ```rust
//! use netdispatch_retry::{Retrier, RetryConfig};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let config = RetryConfig::<&'static str>::builder()
//!     .max_retries(2)
//!     .exponential_backoff(Duration::from_millis(10))
//!     .build();
//! let retrier = Retrier::new(config);
//!
//! let result = retrier.execute(|| async { Ok::<_, &'static str>("ok") }).await;
//! # }
//! ```

mod backoff;
mod config;
mod events;
mod policy;

pub use backoff::{ExponentialBackoff, ExponentialRandomBackoff, FixedInterval, FnInterval, IntervalFunction};
pub use config::{RetryConfig, RetryConfigBuilder, RetrySettings};
pub use events::RetryEvent;
pub use policy::{RetryPolicy, RetryPredicate};

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Runs an async operation with retry-on-failure and backoff, per a
/// [`RetryConfig`].
pub struct Retrier<E> {
    config: Arc<RetryConfig<E>>,
}

impl<E> Clone for Retrier<E> {
    fn clone(&self) -> Self {
        Self { config: Arc::clone(&self.config) }
    }
}

impl<E> Retrier<E> {
    pub fn new(config: RetryConfig<E>) -> Self {
        Self { config: Arc::new(config) }
    }

    /// Invokes `op` up to `1 + max_retries` times. `op` is called again from
    /// scratch on every attempt, so it must be safe to repeat (e.g. an
    /// idempotent HTTP call), not resumed partway through.
    pub async fn execute<F, Fut, T>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let config = &self.config;
        let mut attempt = 0usize;

        loop {
            match op().await {
                Ok(value) => {
                    #[cfg(feature = "metrics")]
                    {
                        counter!("netdispatch_retry_calls_total", "retry" => config.name.clone(), "result" => "success").increment(1);
                        histogram!("netdispatch_retry_attempts", "retry" => config.name.clone()).record((attempt + 1) as f64);
                    }

                    config.event_listeners.emit(&RetryEvent::Success {
                        name: config.name.clone(),
                        timestamp: Instant::now(),
                        attempts: attempt + 1,
                    });
                    return Ok(value);
                }
                Err(error) => {
                    if let Some(exclude) = &config.exclude_predicate {
                        if exclude(&error) {
                            #[cfg(feature = "tracing")]
                            debug!(retry = %config.name, "error excluded from retries, failing immediately");
                            config.event_listeners.emit(&RetryEvent::IgnoredError {
                                name: config.name.clone(),
                                timestamp: Instant::now(),
                            });
                            return Err(error);
                        }
                    }

                    if !config.policy.should_retry(&error) {
                        config.event_listeners.emit(&RetryEvent::IgnoredError {
                            name: config.name.clone(),
                            timestamp: Instant::now(),
                        });
                        return Err(error);
                    }

                    if attempt >= config.max_retries {
                        #[cfg(feature = "metrics")]
                        counter!("netdispatch_retry_calls_total", "retry" => config.name.clone(), "result" => "exhausted").increment(1);

                        #[cfg(feature = "tracing")]
                        warn!(retry = %config.name, attempts = attempt + 1, "retries exhausted");

                        config.event_listeners.emit(&RetryEvent::Error {
                            name: config.name.clone(),
                            timestamp: Instant::now(),
                            attempts: attempt + 1,
                        });
                        return Err(error);
                    }

                    let delay = config.policy.next_backoff(attempt);

                    #[cfg(feature = "metrics")]
                    counter!("netdispatch_retry_attempts_total", "retry" => config.name.clone()).increment(1);

                    #[cfg(feature = "tracing")]
                    debug!(retry = %config.name, attempt = attempt + 1, delay_ms = delay.as_millis(), "retrying after backoff");

                    config.event_listeners.emit(&RetryEvent::Retry {
                        name: config.name.clone(),
                        timestamp: Instant::now(),
                        attempt: attempt + 1,
                        delay,
                    });

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
