//! End-to-end scenario: a low request-rate executor spaces out submissions
//! instead of running them all at once.

use std::time::{Duration, Instant};

use netdispatch::{Executor, ExecutorConfig, RequestStatus};

#[tokio::test]
async fn six_submissions_at_two_per_second_take_at_least_two_and_a_half_seconds() {
    let executor = Executor::new(ExecutorConfig::builder().concurrency(6).request_rate(2.0, Duration::from_secs(1)).num_workers(1).build()).unwrap();
    executor.start().await.unwrap();

    let start = Instant::now();
    let mut events = Vec::new();
    for i in 0..6 {
        let event = executor.submit(move || async move { Ok(serde_json::json!({"i": i})) }, Default::default()).await.unwrap();
        events.push(event);
    }

    for event in &events {
        for _ in 0..500 {
            if event.status().is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(2500), "expected at least 2.5s of gating, got {elapsed:?}");
    for event in &events {
        assert_eq!(event.status(), RequestStatus::Completed);
    }

    executor.stop(true).await;
}
