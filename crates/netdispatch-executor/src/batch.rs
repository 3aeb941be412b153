use std::future::Future;

use tokio::task::JoinSet;

use netdispatch_capacity::CapacityLimiter;

/// Bounded-concurrency fan-out over `items`, per §4.14. Runs at most as many
/// calls concurrently as `limiter` admits, via a [`JoinSet`], and returns
/// results in input order. Propagates the first error encountered; the
/// remaining in-flight calls keep running to completion but their results
/// are discarded.
pub async fn parallel_map<T, F, Fut, R, E>(items: Vec<T>, f: F, limiter: &CapacityLimiter) -> Result<Vec<R>, E>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    let mut set = JoinSet::new();
    for (index, item) in items.into_iter().enumerate() {
        let f = f.clone();
        let limiter = limiter.clone();
        set.spawn(async move {
            let guard = limiter.acquire().await.ok();
            let result = f(item).await;
            if result.is_err() {
                if let Some(guard) = &guard {
                    guard.mark_failed();
                }
            }
            (index, result)
        });
    }

    let mut results: Vec<Option<R>> = (0..set.len()).map(|_| None).collect();
    let mut first_error = None;

    while let Some(joined) = set.join_next().await {
        let (index, result) = joined.expect("parallel_map task panicked");
        match result {
            Ok(value) => results[index] = Some(value),
            Err(error) => {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
    }

    if let Some(error) = first_error {
        return Err(error);
    }

    Ok(results.into_iter().map(|value| value.expect("every index filled when no error occurred")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use netdispatch_capacity::CapacityConfig;

    fn limiter(max_concurrent_calls: usize) -> CapacityLimiter {
        CapacityLimiter::from_config(CapacityConfig::builder().max_concurrent_calls(max_concurrent_calls).build()).unwrap()
    }

    #[tokio::test]
    async fn results_come_back_in_input_order() {
        let limiter = limiter(4);
        let items = vec![5u32, 1, 4, 2, 3];

        let results = parallel_map(
            items,
            |n: u32| async move {
                tokio::time::sleep(std::time::Duration::from_millis((5 - n as u64) * 2)).await;
                Ok::<u32, &'static str>(n * 10)
            },
            &limiter,
        )
        .await
        .unwrap();

        assert_eq!(results, vec![50, 10, 40, 20, 30]);
    }

    #[tokio::test]
    async fn at_most_max_concurrency_calls_run_at_once() {
        let limiter = limiter(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<u32> = (0..6).collect();
        let in_flight_cb = Arc::clone(&in_flight);
        let peak_cb = Arc::clone(&peak);

        let _ = parallel_map(
            items,
            move |_n: u32| {
                let in_flight = Arc::clone(&in_flight_cb);
                let peak = Arc::clone(&peak_cb);
                async move {
                    let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(current, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), &'static str>(())
                }
            },
            &limiter,
        )
        .await
        .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn the_first_error_encountered_is_propagated() {
        let limiter = limiter(4);
        let items = vec![1u32, 2, 3, 4];

        let result = parallel_map(
            items,
            |n: u32| async move {
                if n == 3 {
                    Err("bad item")
                } else {
                    Ok(n)
                }
            },
            &limiter,
        )
        .await;

        assert_eq!(result, Err("bad item"));
    }
}
