use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use netdispatch_capacity::{CapacityConfig, CapacityLimiter};
use netdispatch_core::{RequestDescriptor, RequestEvent, RequestStatus};
use netdispatch_queue::{BoundedWorkQueue, QueueConfig, QueueStatus};
use netdispatch_ratelimiter::{RateLimiter, RateLimiterConfig};

use crate::config::ExecutorConfig;
use crate::error::ExecutorError;
use crate::task::{DispatchOutcome, DispatchTask};

/// The extra fields a caller supplies alongside the closure when
/// submitting, per §4.11's `submit` contract.
#[derive(Default)]
pub struct SubmitOptions {
    pub endpoint_url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub payload: Option<Value>,
    pub tokens_needed: u32,
    pub metadata: HashMap<String, Value>,
}

/// Orchestrates a bounded queue, a concurrency limiter, and one or two
/// rate limiters (request-count and, optionally, token-cost) around a
/// worker pool, per §4.11.
///
/// The acquire sequence inside each worker is invariant: capacity, then
/// request rate, then token rate, then the call itself.
pub struct Executor {
    queue: BoundedWorkQueue<DispatchTask>,
    capacity: CapacityLimiter,
    request_limiter: RateLimiter,
    token_limiter: Option<RateLimiter>,
    num_workers: usize,
    cancel: Mutex<CancellationToken>,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        let queue = BoundedWorkQueue::new(QueueConfig::builder().capacity(config.queue_capacity).name(config.name.clone()).build()?);

        let capacity = CapacityLimiter::from_config(
            CapacityConfig::builder().max_concurrent_calls(config.concurrency).name(format!("{}-capacity", config.name)).build(),
        )?;

        let request_limiter = RateLimiter::from_config(
            RateLimiterConfig::builder()
                .capacity(config.request_bucket_capacity.unwrap_or(config.request_rate))
                .rate(config.request_rate)
                .period(config.request_period)
                .name(format!("{}-request-rate", config.name))
                .build(),
        )?;

        let token_limiter = match (config.token_rate, config.token_period) {
            (Some(rate), Some(period)) => Some(RateLimiter::from_config(
                RateLimiterConfig::builder()
                    .capacity(config.token_bucket_capacity.unwrap_or(rate))
                    .rate(rate)
                    .period(period)
                    .name(format!("{}-token-rate", config.name))
                    .build(),
            )?),
            _ => None,
        };

        Ok(Self {
            queue,
            capacity,
            request_limiter,
            token_limiter,
            num_workers: config.num_workers,
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    /// Idempotent: transitions the queue to `Processing` and (re)spawns the
    /// worker pool.
    pub async fn start(&self) -> Result<(), ExecutorError> {
        *self.cancel.lock().await = CancellationToken::new();
        self.queue.start().await;

        let capacity = self.capacity.clone();
        let request_limiter = self.request_limiter.clone();
        let token_limiter = self.token_limiter.clone();
        let cancel = self.cancel.lock().await.clone();

        self.queue
            .start_workers(
                move |task: &DispatchTask| {
                    let capacity = capacity.clone();
                    let request_limiter = request_limiter.clone();
                    let token_limiter = token_limiter.clone();
                    let cancel = cancel.clone();
                    let event = task.event.clone();
                    let tokens_needed = task.tokens_needed;
                    let call = task.take_call();
                    async move {
                        run_task(event, tokens_needed, call, &capacity, &request_limiter, token_limiter.as_ref(), &cancel).await
                    }
                },
                self.num_workers,
                Some(|error: String, task: &DispatchTask| {
                    task.event.add_log(format!("worker error: {error}"));
                    std::future::ready(())
                }),
            )
            .await?;

        Ok(())
    }

    /// Idempotent. `graceful=true` waits indefinitely for in-flight and
    /// queued work to drain; `graceful=false` cancels the shared token (any
    /// worker that has not yet reached `Calling` marks its event
    /// `Cancelled` instead of running the closure) and cancels workers
    /// within ~100ms.
    pub async fn stop(&self, graceful: bool) {
        if !graceful {
            self.cancel.lock().await.cancel();
        }
        let timeout = if graceful { None } else { Some(Duration::from_millis(100)) };
        self.queue.stop(timeout).await;
    }

    /// Constructs a new event, wraps it with `call` in a task record, and
    /// enqueues it. Refuses with [`ExecutorError::NotRunning`] if the queue
    /// is not currently processing.
    pub async fn submit<F, Fut>(&self, call: F, options: SubmitOptions) -> Result<Arc<RequestEvent>, ExecutorError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = DispatchOutcome> + Send + 'static,
    {
        if self.queue.status().await != QueueStatus::Processing {
            return Err(ExecutorError::NotRunning);
        }

        let descriptor = RequestDescriptor {
            endpoint_url: options.endpoint_url,
            method: options.method,
            headers: options.headers,
            payload: options.payload,
            num_api_tokens_needed: options.tokens_needed,
        };
        let event = Arc::new(RequestEvent::new(descriptor, options.metadata));

        let task = DispatchTask::new(Arc::clone(&event), options.tokens_needed, call);
        self.queue.put(task, None).await?;
        event.update_status(RequestStatus::Queued);

        Ok(event)
    }
}

/// The per-task worker pipeline: capacity acquire, request-rate acquire,
/// optional token-rate acquire, dispatch, release (via the capacity
/// guard's `Drop`).
async fn run_task(
    event: Arc<RequestEvent>,
    tokens_needed: u32,
    call: Option<Pin<Box<dyn Future<Output = DispatchOutcome> + Send>>>,
    capacity: &CapacityLimiter,
    request_limiter: &RateLimiter,
    token_limiter: Option<&RateLimiter>,
    cancel: &CancellationToken,
) -> Result<(), String> {
    event.update_status(RequestStatus::Processing);

    let guard = capacity.acquire().await.map_err(|e| e.to_string())?;

    let wait = request_limiter.acquire(1.0);
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }

    if tokens_needed > 0 {
        if let Some(limiter) = token_limiter {
            let wait = limiter.acquire(tokens_needed as f64);
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }
    }

    // A task that has acquired capacity but has not yet placed the call is
    // still cancellable: a non-graceful stop should not start new calls.
    if cancel.is_cancelled() {
        event.update_status(RequestStatus::Cancelled);
        return Ok(());
    }

    event.update_status(RequestStatus::Calling);

    let outcome = match call {
        Some(call) => call.await,
        None => Err("task closure already consumed".to_string()),
    };

    match outcome {
        Ok(body) => {
            event.set_result(200, None, Some(body));
            Ok(())
        }
        Err(message) => {
            event.set_error("DispatchError", message.clone(), None);
            guard.mark_failed();
            Err(message)
        }
    }
}
