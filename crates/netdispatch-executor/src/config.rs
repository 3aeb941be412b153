use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Construction parameters for an [`crate::Executor`], per §4.11. Round-trips
/// through `serde_json` so a deployment's executor pool sizing can live in a
/// config file alongside the endpoint table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub(crate) name: String,
    pub(crate) queue_capacity: usize,
    pub(crate) concurrency: usize,
    pub(crate) request_rate: f64,
    pub(crate) request_period: Duration,
    pub(crate) request_bucket_capacity: Option<f64>,
    pub(crate) token_rate: Option<f64>,
    pub(crate) token_period: Option<Duration>,
    pub(crate) token_bucket_capacity: Option<f64>,
    pub(crate) num_workers: usize,
}

impl ExecutorConfig {
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::new()
    }
}

pub struct ExecutorConfigBuilder {
    name: String,
    queue_capacity: usize,
    concurrency: usize,
    request_rate: f64,
    request_period: Duration,
    request_bucket_capacity: Option<f64>,
    token_rate: Option<f64>,
    token_period: Option<Duration>,
    token_bucket_capacity: Option<f64>,
    num_workers: usize,
}

impl ExecutorConfigBuilder {
    /// Defaults: queue capacity 100, concurrency 10, 10 requests/second, no
    /// token limiter, 4 workers.
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            queue_capacity: 100,
            concurrency: 10,
            request_rate: 10.0,
            request_period: Duration::from_secs(1),
            request_bucket_capacity: None,
            token_rate: None,
            token_period: None,
            token_bucket_capacity: None,
            num_workers: 4,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Requests allowed per `period`; a matching bucket capacity is used
    /// unless overridden with [`Self::request_bucket_capacity`].
    pub fn request_rate(mut self, rate: f64, period: Duration) -> Self {
        self.request_rate = rate;
        self.request_period = period;
        self
    }

    pub fn request_bucket_capacity(mut self, capacity: f64) -> Self {
        self.request_bucket_capacity = Some(capacity);
        self
    }

    /// Enables the optional token rate limiter for calls with
    /// `tokens_needed > 0`.
    pub fn token_rate(mut self, rate: f64, period: Duration) -> Self {
        self.token_rate = Some(rate);
        self.token_period = Some(period);
        self
    }

    pub fn token_bucket_capacity(mut self, capacity: f64) -> Self {
        self.token_bucket_capacity = Some(capacity);
        self
    }

    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn build(self) -> ExecutorConfig {
        ExecutorConfig {
            name: self.name,
            queue_capacity: self.queue_capacity,
            concurrency: self.concurrency,
            request_rate: self.request_rate,
            request_period: self.request_period,
            request_bucket_capacity: self.request_bucket_capacity,
            token_rate: self.token_rate,
            token_period: self.token_period,
            token_bucket_capacity: self.token_bucket_capacity,
            num_workers: self.num_workers,
        }
    }
}

impl Default for ExecutorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
