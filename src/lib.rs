//! Concurrency-controlled, rate-limited, resilient dispatcher for outbound
//! API requests.
//!
//! This crate re-exports the public surface of its component crates so a
//! caller depends on a single name. See [`netdispatch_facade::Facade`] for
//! the entry point.

pub use netdispatch_capacity::{CapacityConfig, CapacityConfigBuilder, CapacityError, CapacityEvent, CapacityGuard, CapacityLimiter};
pub use netdispatch_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerSettings, CircuitState};
pub use netdispatch_core::{DispatchEvent, EventListener, EventListeners, FnListener, RequestDescriptor, RequestEvent, RequestStatus};
pub use netdispatch_endpoint::{Endpoint, EndpointClient, EndpointConfig, EndpointConfigBuilder, EndpointError, HttpConfig, SdkConfig, TransportKind};
pub use netdispatch_executor::{DispatchOutcome, Executor, ExecutorConfig, ExecutorConfigBuilder, ExecutorError, SubmitOptions, parallel_map};
pub use netdispatch_facade::{Facade, InvokeOptions, NetdispatchError};
pub use netdispatch_queue::{BoundedWorkQueue, QueueConfig, QueueConfigBuilder, QueueError, QueueEvent, QueueMetrics, QueueStatus};
pub use netdispatch_ratelimiter::{
    AdaptiveRateLimiter, RateLimiter, RateLimiterConfig, RateLimiterConfigBuilder, RateLimiterError, RateLimiterEvent, RateLimiterRegistry,
    RateLimiterSettings, TokenBucket,
};
pub use netdispatch_retry::{
    ExponentialBackoff, ExponentialRandomBackoff, FixedInterval, RetryConfig, RetryConfigBuilder, RetryEvent, RetryPolicy, RetryPredicate,
    RetrySettings, Retrier,
};
pub use netdispatch_transport::{AnthropicAdapter, HttpClientConfig, HttpTransportClient, OpenAiAdapter, SdkAdapter, SdkAdapterConfig, SdkAdapterFactory, TransportError};
