//! Backoff strategies for spacing out retry attempts.

use std::time::Duration;

/// Computes the delay before a retry attempt.
pub trait IntervalFunction: Send + Sync {
    /// Delay before the given attempt, 0-indexed (0 is the first retry).
    fn next_interval(&self, attempt: usize) -> Duration;
}

/// Always waits the same duration between attempts.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IntervalFunction for FixedInterval {
    fn next_interval(&self, _attempt: usize) -> Duration {
        self.duration
    }
}

/// Doubles (by default) on every attempt, optionally capped.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Option<Duration>,
}

impl ExponentialBackoff {
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            multiplier: 2.0,
            max_interval: None,
        }
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, attempt: usize) -> Duration {
        let interval = self.initial_interval.mul_f64(self.multiplier.powi(attempt as i32));
        match self.max_interval {
            Some(max) => interval.min(max),
            None => interval,
        }
    }
}

/// Exponential backoff with jitter, to keep concurrent callers from
/// retrying in lockstep against the same endpoint.
#[derive(Debug, Clone)]
pub struct ExponentialRandomBackoff {
    initial_interval: Duration,
    multiplier: f64,
    randomization_factor: f64,
    max_interval: Option<Duration>,
}

impl ExponentialRandomBackoff {
    /// `randomization_factor` of 0.5 spreads the computed interval across
    /// 50%-150% of its nominal value.
    pub fn new(initial_interval: Duration, randomization_factor: f64) -> Self {
        Self {
            initial_interval,
            multiplier: 2.0,
            randomization_factor: randomization_factor.clamp(0.0, 1.0),
            max_interval: None,
        }
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }

    fn jitter(&self, duration: Duration) -> Duration {
        use rand::Rng;
        let mut rng = rand::rng();
        let delta = duration.as_secs_f64() * self.randomization_factor;
        let low = duration.as_secs_f64() - delta;
        let high = duration.as_secs_f64() + delta;
        Duration::from_secs_f64(rng.random_range(low..=high).max(0.0))
    }
}

impl IntervalFunction for ExponentialRandomBackoff {
    fn next_interval(&self, attempt: usize) -> Duration {
        let interval = self.initial_interval.mul_f64(self.multiplier.powi(attempt as i32));
        let capped = match self.max_interval {
            Some(max) => interval.min(max),
            None => interval,
        };
        self.jitter(capped)
    }
}

/// Wraps an arbitrary closure as an [`IntervalFunction`].
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_interval(&self, attempt: usize) -> Duration {
        (self.f)(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_interval_never_changes() {
        let backoff = FixedInterval::new(Duration::from_secs(1));
        assert_eq!(backoff.next_interval(0), Duration::from_secs(1));
        assert_eq!(backoff.next_interval(10), Duration::from_secs(1));
    }

    #[test]
    fn exponential_backoff_doubles_by_default() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100));
        assert_eq!(backoff.next_interval(0), Duration::from_millis(100));
        assert_eq!(backoff.next_interval(1), Duration::from_millis(200));
        assert_eq!(backoff.next_interval(2), Duration::from_millis(400));
    }

    #[test]
    fn exponential_backoff_respects_a_cap() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100)).max_interval(Duration::from_millis(300));
        assert_eq!(backoff.next_interval(3), Duration::from_millis(300));
    }

    #[test]
    fn exponential_random_backoff_stays_within_range_and_varies() {
        let backoff = ExponentialRandomBackoff::new(Duration::from_millis(100), 0.5);
        let samples: Vec<_> = (0..10).map(|_| backoff.next_interval(1)).collect();
        assert!(samples.windows(2).any(|w| w[0] != w[1]));
        for interval in samples {
            assert!(interval >= Duration::from_millis(100) && interval <= Duration::from_millis(300));
        }
    }

    #[test]
    fn fn_interval_delegates_to_the_closure() {
        let backoff = FnInterval::new(|attempt| Duration::from_secs((attempt + 1) as u64));
        assert_eq!(backoff.next_interval(2), Duration::from_secs(3));
    }
}
