//! End-to-end scenario: a retrier wraps the closure handed to the executor.
//! Retry, like the circuit breaker, is a caller-composed policy rather than
//! a step in the executor's own pipeline (see DESIGN.md).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use netdispatch::{Executor, ExecutorConfig, RequestStatus, RetryConfig, Retrier};

#[derive(Debug, Clone, PartialEq, Eq)]
struct TimeoutError;

#[tokio::test]
async fn two_timeouts_then_success_completes_on_the_third_attempt() {
    let retrier: Retrier<TimeoutError> =
        Retrier::new(RetryConfig::builder().max_retries(2).exponential_backoff(Duration::from_millis(10)).build());

    let executor = Executor::new(ExecutorConfig::builder().concurrency(4).request_rate(100.0, Duration::from_secs(1)).num_workers(2).build()).unwrap();
    executor.start().await.unwrap();

    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_cb = Arc::clone(&attempts);

    let event = executor
        .submit(
            move || {
                let attempts_cb = Arc::clone(&attempts_cb);
                let retrier = retrier.clone();
                async move {
                    retrier
                        .execute(move || {
                            let n = attempts_cb.fetch_add(1, Ordering::SeqCst);
                            async move { if n < 2 { Err(TimeoutError) } else { Ok(serde_json::json!({"ok": true})) } }
                        })
                        .await
                        .map_err(|_| "timed out after retries".to_string())
                }
            },
            Default::default(),
        )
        .await
        .unwrap();

    for _ in 0..100 {
        if event.status().is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(event.status(), RequestStatus::Completed);
    let (_, _, body) = event.response().unwrap();
    assert_eq!(body.unwrap()["ok"], true);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);

    executor.stop(true).await;
}
