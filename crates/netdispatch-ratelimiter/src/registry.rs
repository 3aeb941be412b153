//! Endpoint-keyed rate limiter registry.
//!
//! Grounded on §4.2: maps an endpoint key to a dedicated limiter created on
//! first use with defaults, with `update_rate_limit` to rescale an
//! existing limiter without a sudden credit or deficit.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::RateLimiterConfig;
use crate::error::RateLimiterError;
use crate::named::RateLimiter;

/// Lazily creates and caches a [`RateLimiter`] per endpoint key.
pub struct RateLimiterRegistry {
    defaults: RateLimiterDefaults,
    limiters: Mutex<HashMap<String, RateLimiter>>,
}

#[derive(Clone, Copy)]
struct RateLimiterDefaults {
    capacity: f64,
    rate: f64,
    period: Duration,
}

impl RateLimiterRegistry {
    pub fn new(default_rate: f64, default_period: Duration, default_capacity: f64) -> Self {
        Self {
            defaults: RateLimiterDefaults {
                capacity: default_capacity,
                rate: default_rate,
                period: default_period,
            },
            limiters: Mutex::new(HashMap::new()),
        }
    }

    fn get_or_create(&self, endpoint_key: &str) -> RateLimiter {
        let mut limiters = self.limiters.lock().unwrap();
        if let Some(limiter) = limiters.get(endpoint_key) {
            return limiter.clone();
        }
        let config = RateLimiterConfig::builder()
            .name(endpoint_key)
            .capacity(self.defaults.capacity)
            .rate(self.defaults.rate)
            .period(self.defaults.period)
            .build();
        let limiter = RateLimiter::from_config(config).expect("registry defaults are always valid");
        limiters.insert(endpoint_key.to_string(), limiter.clone());
        limiter
    }

    /// Runs `fut` through the limiter for `endpoint_key`, creating it with
    /// defaults on first use.
    pub async fn execute<F, Fut, T>(&self, endpoint_key: &str, cost: f64, fut: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let limiter = self.get_or_create(endpoint_key);
        limiter.execute(cost, fut).await
    }

    /// Rescales the limiter for `endpoint_key`. `reset_tokens = true`
    /// refills it to the new capacity instead of scaling proportionally.
    pub fn update_rate_limit(
        &self,
        endpoint_key: &str,
        rate: f64,
        period: Duration,
        capacity: f64,
        reset_tokens: bool,
    ) -> Result<(), RateLimiterError> {
        let limiters = self.limiters.lock().unwrap();
        let limiter = limiters
            .get(endpoint_key)
            .ok_or_else(|| RateLimiterError::UnknownEndpoint(endpoint_key.to_string()))?;
        limiter.bucket().update(capacity, rate, period, reset_tokens);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_use_creates_a_limiter_with_defaults() {
        let registry = RateLimiterRegistry::new(10.0, Duration::from_secs(1), 10.0);
        let result = registry.execute("svc-a", 1.0, || async { "ok" }).await;
        assert_eq!(result, "ok");
    }

    #[tokio::test]
    async fn updating_an_unknown_endpoint_errors() {
        let registry = RateLimiterRegistry::new(10.0, Duration::from_secs(1), 10.0);
        let err = registry
            .update_rate_limit("never-used", 5.0, Duration::from_secs(1), 5.0, true)
            .unwrap_err();
        assert!(matches!(err, RateLimiterError::UnknownEndpoint(_)));
    }

    #[tokio::test]
    async fn distinct_keys_get_distinct_independent_limiters() {
        let registry = RateLimiterRegistry::new(1.0, Duration::from_secs(1), 1.0);
        registry.execute("a", 1.0, || async {}).await;
        registry
            .update_rate_limit("a", 100.0, Duration::from_secs(1), 100.0, true)
            .unwrap();
        // "b" was never touched, so it should still exist only with defaults
        // once it is first used, independent of "a"'s update.
        registry.execute("b", 1.0, || async {}).await;
        let err = registry.update_rate_limit("c", 1.0, Duration::from_secs(1), 1.0, true);
        assert!(err.is_err());
    }
}
