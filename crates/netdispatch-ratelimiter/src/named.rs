use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use netdispatch_core::EventListeners;

use crate::config::RateLimiterConfig;
use crate::events::RateLimiterEvent;
use crate::limiter::TokenBucket;

/// A [`TokenBucket`] paired with a name and event listeners, the unit that
/// the executor and the endpoint registry actually hold.
#[derive(Clone)]
pub struct RateLimiter {
    bucket: TokenBucket,
    name: Arc<str>,
    event_listeners: Arc<EventListeners<RateLimiterEvent>>,
}

impl RateLimiter {
    pub fn from_config(config: RateLimiterConfig) -> Result<Self, crate::error::RateLimiterError> {
        let bucket = TokenBucket::new(config.capacity, config.rate, config.period)?;
        Ok(Self {
            bucket,
            name: config.name.into(),
            event_listeners: Arc::new(config.event_listeners),
        })
    }

    pub fn bucket(&self) -> &TokenBucket {
        &self.bucket
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// See [`TokenBucket::acquire`]; additionally emits a
    /// [`RateLimiterEvent::Waited`] and logs/records metrics when the wait
    /// is non-zero.
    pub fn acquire(&self, cost: f64) -> std::time::Duration {
        let wait = self.bucket.acquire(cost);
        if !wait.is_zero() {
            #[cfg(feature = "tracing")]
            tracing::debug!(limiter = %self.name, cost, wait_ms = wait.as_millis(), "rate limiter wait");

            #[cfg(feature = "metrics")]
            metrics::histogram!("netdispatch_ratelimiter_wait_seconds", "limiter" => self.name.to_string())
                .record(wait.as_secs_f64());

            self.event_listeners.emit(&RateLimiterEvent::Waited {
                name: self.name.to_string(),
                cost,
                duration: wait,
                timestamp: Instant::now(),
            });
        }
        wait
    }

    pub async fn execute<F, Fut, T>(&self, cost: f64, fut: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let wait = self.acquire(cost);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        fut().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn execute_runs_the_future_after_any_wait() {
        let limiter = RateLimiter::from_config(
            RateLimiterConfig::builder()
                .capacity(1.0)
                .rate(1000.0)
                .period(Duration::from_secs(1))
                .build(),
        )
        .unwrap();

        let ran = limiter.execute(1.0, || async { 42 }).await;
        assert_eq!(ran, 42);
    }

    #[test]
    fn wait_events_fire_only_when_the_caller_actually_waits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let limiter = RateLimiter::from_config(
            RateLimiterConfig::builder()
                .capacity(1.0)
                .rate(1.0)
                .period(Duration::from_secs(1))
                .on_wait(move |_| {
                    calls_clone.fetch_add(1, Ordering::SeqCst);
                })
                .build(),
        )
        .unwrap();

        limiter.acquire(0.5);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        limiter.acquire(5.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
