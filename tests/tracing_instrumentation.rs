//! Ambient-stack property: circuit state transitions, retry attempts,
//! rate-limiter waits above zero, and queue backpressure each emit a
//! `tracing` event, captured here with a writer-backed subscriber the way
//! `netdispatch-core`'s own listener-panic test does.

#![cfg(feature = "tracing")]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netdispatch::{BoundedWorkQueue, CircuitBreaker, CircuitBreakerConfig, QueueConfig, RateLimiter, RateLimiterConfig, RetryConfig, Retrier};
use tracing_subscriber::fmt;

#[derive(Clone)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn captured<F: FnOnce()>(f: F) -> String {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer_buffer = buffer.clone();
    let subscriber = fmt().with_max_level(tracing::Level::DEBUG).without_time().with_writer(move || CaptureWriter(writer_buffer.clone())).finish();
    tracing::subscriber::with_default(subscriber, f);
    String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
}

#[test]
fn circuit_state_transition_is_logged() {
    let output = captured(|| {
        let breaker: CircuitBreaker<(), &'static str> = CircuitBreaker::new(CircuitBreakerConfig::builder().failure_threshold(1).name("billing").build());
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let _ = breaker.execute(|| async { Err("boom") }).await;
        });
    });

    assert!(output.contains("circuit breaker state transition"), "expected a state-transition log, got: {output}");
    assert!(output.contains("billing"), "expected the breaker's name in the log, got: {output}");
}

#[test]
fn a_retry_attempt_is_logged() {
    let output = captured(|| {
        let retrier: Retrier<&'static str> =
            Retrier::new(RetryConfig::builder().max_retries(2).fixed_backoff(Duration::from_millis(1)).name("orders-api").build());
        let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        rt.block_on(async {
            let mut calls = 0;
            let _ = retrier
                .execute(|| {
                    calls += 1;
                    async move { if calls < 2 { Err("transient") } else { Ok::<_, &'static str>(()) } }
                })
                .await;
        });
    });

    assert!(output.contains("retrying after backoff"), "expected a retry log, got: {output}");
    assert!(output.contains("orders-api"), "expected the retrier's name in the log, got: {output}");
}

#[test]
fn a_nonzero_rate_limiter_wait_is_logged() {
    let output = captured(|| {
        let limiter = RateLimiter::from_config(RateLimiterConfig::builder().capacity(1.0).rate(1.0).period(Duration::from_secs(60)).name("completions").build())
            .unwrap();
        limiter.acquire(1.0);
        limiter.acquire(1.0);
    });

    assert!(output.contains("rate limiter wait"), "expected a rate-limiter wait log, got: {output}");
    assert!(output.contains("completions"), "expected the limiter's name in the log, got: {output}");
}

#[test]
fn queue_backpressure_is_logged() {
    let output = captured(|| {
        let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        rt.block_on(async {
            let queue: BoundedWorkQueue<u32> = BoundedWorkQueue::new(QueueConfig::builder().capacity(1).name("ingest").build().unwrap());
            queue.start().await;
            queue.put(1, Some(Duration::from_millis(5))).await.unwrap();
            let accepted = queue.put(2, Some(Duration::from_millis(5))).await.unwrap();
            assert!(!accepted);
        });
    });

    assert!(output.contains("queue under backpressure"), "expected a backpressure log, got: {output}");
    assert!(output.contains("ingest"), "expected the queue's name in the log, got: {output}");
}
