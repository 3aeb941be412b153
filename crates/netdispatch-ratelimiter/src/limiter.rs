//! Token-bucket rate limiter.
//!
//! Grounded on the `TokenBucket` in the Anthropic SDK's resilience module
//! (capacity/tokens/refill_rate/last_update, refilled lazily on each
//! access) and on the teacher's `SharedRateLimiter` style of wrapping the
//! mutable state in `Arc<Mutex<_>>` behind an async `acquire`.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::RateLimiterError;

#[derive(Debug)]
struct TokenBucketState {
    tokens: f64,
    capacity: f64,
    /// Tokens regained per `period`.
    rate: f64,
    period: Duration,
    last_refill: Instant,
}

impl TokenBucketState {
    fn new(capacity: f64, rate: f64, period: Duration) -> Self {
        Self {
            tokens: capacity,
            capacity,
            rate,
            period,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let gained = elapsed.as_secs_f64() * self.rate / self.period.as_secs_f64();
        self.tokens = (self.tokens + gained).min(self.capacity);
        self.last_refill = now;
    }

    fn tokens_per_second(&self) -> f64 {
        self.rate / self.period.as_secs_f64()
    }

    /// Refills, then deducts `cost` unconditionally (balance may go
    /// negative, tracking outstanding debt), returning how long the caller
    /// should wait before the deduction is "earned back".
    fn acquire(&mut self, cost: f64) -> Duration {
        self.refill(Instant::now());
        let shortfall = (cost - self.tokens).max(0.0);
        let wait = shortfall / self.tokens_per_second();
        self.tokens -= cost;
        Duration::from_secs_f64(wait)
    }

    fn rescale(&mut self, new_capacity: f64, new_rate: f64, new_period: Duration, reset_tokens: bool) {
        self.refill(Instant::now());
        if reset_tokens {
            self.tokens = new_capacity;
        } else if self.capacity > 0.0 {
            self.tokens = (self.tokens / self.capacity) * new_capacity;
        }
        self.capacity = new_capacity;
        self.rate = new_rate;
        self.period = new_period;
    }
}

/// A token-bucket rate limiter shared by every worker dispatching through
/// it. State mutations linearize under an internal mutex.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    inner: Arc<Mutex<TokenBucketState>>,
}

impl TokenBucket {
    /// Creates a bucket with the given capacity and refill rate (`rate`
    /// tokens per `period`). `rate` and `capacity` must be strictly
    /// positive.
    pub fn new(capacity: f64, rate: f64, period: Duration) -> Result<Self, RateLimiterError> {
        if rate <= 0.0 {
            return Err(RateLimiterError::InvalidRate(rate));
        }
        if capacity <= 0.0 {
            return Err(RateLimiterError::InvalidCapacity(capacity));
        }
        Ok(Self {
            inner: Arc::new(Mutex::new(TokenBucketState::new(capacity, rate, period))),
        })
    }

    /// Computes how long the caller should wait before `cost` tokens are
    /// earned, deducting `cost` from the bucket immediately regardless.
    /// Never sleeps itself.
    pub fn acquire(&self, cost: f64) -> Duration {
        self.inner.lock().unwrap().acquire(cost)
    }

    /// Calls `acquire`, sleeps for the returned wait if positive, then
    /// runs `fut`.
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

    /// Rescales capacity/rate/period. When `reset_tokens` is true the
    /// bucket is refilled to the new capacity; otherwise the current
    /// balance is scaled proportionally so a rate change never produces a
    /// sudden credit or deficit.
    pub fn update(&self, new_capacity: f64, new_rate: f64, new_period: Duration, reset_tokens: bool) {
        self.inner
            .lock()
            .unwrap()
            .rescale(new_capacity, new_rate, new_period, reset_tokens);
    }

    /// Current token balance after an implicit refill (for tests/metrics).
    pub fn current_tokens(&self) -> f64 {
        let mut state = self.inner.lock().unwrap();
        state.refill(Instant::now());
        state.tokens
    }

    pub fn capacity(&self) -> f64 {
        self.inner.lock().unwrap().capacity
    }
}
