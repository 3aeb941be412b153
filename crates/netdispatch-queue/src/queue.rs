use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex, Notify};
use tokio_util::sync::CancellationToken;

use netdispatch_core::EventListeners;

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::events::QueueEvent;

/// The lifecycle states of a [`BoundedWorkQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Idle,
    Processing,
    Stopping,
    Stopped,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct QueueMetrics {
    pub enqueued: u64,
    pub processed: u64,
    pub errored: u64,
    pub backpressure: u64,
}

struct MetricCounters {
    enqueued: AtomicU64,
    processed: AtomicU64,
    errored: AtomicU64,
    backpressure: AtomicU64,
}

impl MetricCounters {
    fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            errored: AtomicU64::new(0),
            backpressure: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> QueueMetrics {
        QueueMetrics {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            errored: self.errored.load(Ordering::Relaxed),
            backpressure: self.backpressure.load(Ordering::Relaxed),
        }
    }
}

struct Inner<T> {
    sender: mpsc::Sender<T>,
    receiver: Mutex<mpsc::Receiver<T>>,
    capacity: usize,
    size: AtomicUsize,
    outstanding: AtomicUsize,
    status: Mutex<QueueStatus>,
    drain_notify: Notify,
    cancel_token: Mutex<CancellationToken>,
    workers: Mutex<Vec<tokio::task::JoinHandle<()>>>,
    metrics: MetricCounters,
    event_listeners: EventListeners<QueueEvent>,
    name: String,
}

/// Fixed-capacity FIFO with an explicit status machine and a worker pool,
/// per §4.5.
pub struct BoundedWorkQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for BoundedWorkQueue<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Send + 'static> BoundedWorkQueue<T> {
    pub fn new(config: QueueConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.capacity);
        Self {
            inner: Arc::new(Inner {
                sender,
                receiver: Mutex::new(receiver),
                capacity: config.capacity,
                size: AtomicUsize::new(0),
                outstanding: AtomicUsize::new(0),
                status: Mutex::new(QueueStatus::Idle),
                drain_notify: Notify::new(),
                cancel_token: Mutex::new(CancellationToken::new()),
                workers: Mutex::new(Vec::new()),
                metrics: MetricCounters::new(),
                event_listeners: config.event_listeners,
                name: config.name,
            }),
        }
    }

    pub async fn status(&self) -> QueueStatus {
        *self.inner.status.lock().await
    }

    pub fn size(&self) -> usize {
        self.inner.size.load(Ordering::Acquire)
    }

    pub fn is_full(&self) -> bool {
        self.size() >= self.inner.capacity
    }

    pub async fn worker_count(&self) -> usize {
        self.inner.workers.lock().await.len()
    }

    pub fn metrics(&self) -> QueueMetrics {
        self.inner.metrics.snapshot()
    }

    /// Idempotent: transitions `Idle` to `Processing`; any other state is a
    /// no-op.
    pub async fn start(&self) {
        let mut status = self.inner.status.lock().await;
        if *status == QueueStatus::Idle {
            self.transition(&mut status, QueueStatus::Processing);
        }
    }

    /// Enqueues `item`, waiting up to `timeout` for room (or indefinitely if
    /// `None`). Returns `Ok(false)` on timeout rather than an error, so
    /// backpressure can be handled without matching on an error variant.
    pub async fn put(&self, item: T, timeout: Option<Duration>) -> Result<bool, QueueError> {
        {
            let status = self.inner.status.lock().await;
            if *status != QueueStatus::Processing {
                return Err(QueueError::NotRunning(*status));
            }
        }

        let send_result = match timeout {
            Some(duration) => tokio::time::timeout(duration, self.inner.sender.send(item)).await,
            None => Ok(self.inner.sender.send(item).await),
        };

        match send_result {
            Ok(Ok(())) => {
                self.inner.size.fetch_add(1, Ordering::AcqRel);
                self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
                self.inner.metrics.enqueued.fetch_add(1, Ordering::Relaxed);
                self.inner.event_listeners.emit(&QueueEvent::Enqueued {
                    name: self.inner.name.clone(),
                    timestamp: Instant::now(),
                    size: self.size(),
                });
                Ok(true)
            }
            Ok(Err(_)) => Err(QueueError::Closed),
            Err(_elapsed) => {
                self.inner.metrics.backpressure.fetch_add(1, Ordering::Relaxed);

                #[cfg(feature = "tracing")]
                tracing::warn!(queue = %self.inner.name, size = self.size(), "put timed out, queue under backpressure");

                self.inner.event_listeners.emit(&QueueEvent::Backpressure {
                    name: self.inner.name.clone(),
                    timestamp: Instant::now(),
                });
                Ok(false)
            }
        }
    }

    /// Dequeues the next item. Callers must call [`Self::task_done`] once
    /// they finish processing it.
    pub async fn get(&self) -> Result<T, QueueError> {
        {
            let status = self.inner.status.lock().await;
            if *status != QueueStatus::Processing {
                return Err(QueueError::NotRunning(*status));
            }
        }

        let mut receiver = self.inner.receiver.lock().await;
        match receiver.recv().await {
            Some(item) => {
                self.inner.size.fetch_sub(1, Ordering::AcqRel);
                Ok(item)
            }
            None => Err(QueueError::Closed),
        }
    }

    /// Marks one outstanding item as successfully processed, waking any
    /// [`Self::join`] callers once the count reaches zero. Counts toward
    /// `processed`, not `errored` — call [`Self::task_failed`] instead if
    /// the item's processing failed, so `enqueued = processed + errored +
    /// outstanding` holds.
    pub fn task_done(&self) {
        self.inner.metrics.processed.fetch_add(1, Ordering::Relaxed);
        self.inner.event_listeners.emit(&QueueEvent::Processed {
            name: self.inner.name.clone(),
            timestamp: Instant::now(),
        });
        self.mark_outstanding_complete();
    }

    /// Marks one outstanding item as having failed processing, waking any
    /// [`Self::join`] callers once the count reaches zero. Does not touch
    /// `processed`; the caller is expected to have already recorded the
    /// failure (e.g. `errored`) before calling this.
    pub fn task_failed(&self) {
        self.mark_outstanding_complete();
    }

    fn mark_outstanding_complete(&self) {
        let remaining = self.inner.outstanding.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining == 0 {
            self.inner.drain_notify.notify_waiters();
        }
    }

    /// Waits until every enqueued item has been matched with a
    /// [`Self::task_done`] call.
    pub async fn join(&self) {
        loop {
            if self.inner.outstanding.load(Ordering::Acquire) == 0 {
                return;
            }
            let notified = self.inner.drain_notify.notified();
            if self.inner.outstanding.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Spawns exactly `num_workers` tasks that loop get → `worker_fn` →
    /// `task_done` on success or `task_failed` on error. Replaces any
    /// previously running workers.
    pub async fn start_workers<F, Fut, E, EH, EHFut>(
        &self,
        worker_fn: F,
        num_workers: usize,
        error_handler: Option<EH>,
    ) -> Result<(), QueueError>
    where
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send,
        E: fmt::Display + Send + 'static,
        EH: Fn(E, &T) -> EHFut + Send + Sync + 'static,
        EHFut: Future<Output = ()> + Send,
        T: Sync,
    {
        if num_workers == 0 {
            return Err(QueueError::InvalidWorkerCount(0));
        }

        self.stop_workers().await;

        let token = CancellationToken::new();
        *self.inner.cancel_token.lock().await = token.clone();

        let worker_fn = Arc::new(worker_fn);
        let error_handler = error_handler.map(Arc::new);

        let mut handles = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let queue = self.clone();
            let worker_fn = Arc::clone(&worker_fn);
            let error_handler = error_handler.clone();
            let token = token.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    let item = tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        result = queue.get() => result,
                    };

                    let item = match item {
                        Ok(item) => item,
                        Err(_) => break,
                    };

                    match worker_fn(&item).await {
                        Ok(()) => queue.task_done(),
                        Err(error) => {
                            queue.inner.metrics.errored.fetch_add(1, Ordering::Relaxed);
                            queue.inner.event_listeners.emit(&QueueEvent::Errored {
                                name: queue.inner.name.clone(),
                                timestamp: Instant::now(),
                            });
                            match &error_handler {
                                Some(handler) => handler(error, &item).await,
                                None => {
                                    #[cfg(feature = "tracing")]
                                    tracing::error!(queue = %queue.inner.name, error = %error, "error processing item");
                                    #[cfg(not(feature = "tracing"))]
                                    let _ = error;
                                }
                            }
                            queue.task_failed();
                        }
                    }
                }
            }));
        }

        *self.inner.workers.lock().await = handles;
        Ok(())
    }

    async fn stop_workers(&self) {
        self.inner.cancel_token.lock().await.cancel();
        let mut handles = self.inner.workers.lock().await;
        for handle in handles.drain(..) {
            handle.abort();
        }
    }

    /// Idempotent: `Processing → Stopping`, waits up to `timeout` for
    /// outstanding work to drain, then cancels remaining workers and
    /// transitions to `Stopped`.
    pub async fn stop(&self, timeout: Option<Duration>) {
        {
            let mut status = self.inner.status.lock().await;
            if *status == QueueStatus::Stopped {
                return;
            }
            if *status == QueueStatus::Processing {
                self.transition(&mut status, QueueStatus::Stopping);
            }
        }

        match timeout {
            Some(duration) => {
                let _ = tokio::time::timeout(duration, self.join()).await;
            }
            None => self.join().await,
        }

        self.stop_workers().await;

        let mut status = self.inner.status.lock().await;
        self.transition(&mut status, QueueStatus::Stopped);
    }

    fn transition(&self, status: &mut QueueStatus, to: QueueStatus) {
        let from = *status;
        if from == to {
            return;
        }
        *status = to;
        self.inner.event_listeners.emit(&QueueEvent::StatusChanged {
            name: self.inner.name.clone(),
            timestamp: Instant::now(),
            from,
            to,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize as StdAtomicUsize;

    fn config(capacity: usize) -> QueueConfig {
        QueueConfig::builder().capacity(capacity).name("test-queue").build().unwrap()
    }

    #[tokio::test]
    async fn starts_idle_and_transitions_to_processing() {
        let queue: BoundedWorkQueue<i32> = BoundedWorkQueue::new(config(3));
        assert_eq!(queue.status().await, QueueStatus::Idle);
        queue.start().await;
        assert_eq!(queue.status().await, QueueStatus::Processing);
        queue.start().await;
        assert_eq!(queue.status().await, QueueStatus::Processing);
    }

    #[tokio::test]
    async fn put_before_start_is_rejected() {
        let queue: BoundedWorkQueue<i32> = BoundedWorkQueue::new(config(3));
        let err = queue.put(1, None).await.unwrap_err();
        assert_eq!(err, QueueError::NotRunning(QueueStatus::Idle));
    }

    #[tokio::test]
    async fn put_get_task_done_and_join_round_trip() {
        let queue: BoundedWorkQueue<i32> = BoundedWorkQueue::new(config(3));
        queue.start().await;

        assert_eq!(queue.put(1, None).await, Ok(true));
        assert_eq!(queue.size(), 1);
        assert_eq!(queue.metrics().enqueued, 1);

        let item = queue.get().await.unwrap();
        assert_eq!(item, 1);
        queue.task_done();
        assert_eq!(queue.metrics().processed, 1);

        queue.join().await;
    }

    #[tokio::test]
    async fn a_full_queue_applies_backpressure_on_timeout() {
        let queue: BoundedWorkQueue<i32> = BoundedWorkQueue::new(config(2));
        queue.start().await;

        assert_eq!(queue.put(1, None).await, Ok(true));
        assert_eq!(queue.put(2, None).await, Ok(true));
        assert!(queue.is_full());

        let result = queue.put(3, Some(Duration::from_millis(10))).await;
        assert_eq!(result, Ok(false));
        assert_eq!(queue.metrics().backpressure, 1);
        assert_eq!(queue.size(), 2);
    }

    #[tokio::test]
    async fn start_workers_rejects_zero_workers() {
        let queue: BoundedWorkQueue<i32> = BoundedWorkQueue::new(config(3));
        queue.start().await;
        let result = queue.start_workers(|_: &i32| async { Ok::<(), String>(()) }, 0, None::<fn(String, &i32) -> std::future::Ready<()>>).await;
        assert_eq!(result.unwrap_err(), QueueError::InvalidWorkerCount(0));
    }

    #[tokio::test]
    async fn workers_process_every_enqueued_item() {
        let queue: BoundedWorkQueue<i32> = BoundedWorkQueue::new(config(5));
        queue.start().await;

        let processed = Arc::new(StdAtomicUsize::new(0));
        let processed_worker = Arc::clone(&processed);

        queue
            .start_workers(
                move |_item: &i32| {
                    let processed = Arc::clone(&processed_worker);
                    async move {
                        processed.fetch_add(1, Ordering::SeqCst);
                        Ok::<(), String>(())
                    }
                },
                2,
                None::<fn(String, &i32) -> std::future::Ready<()>>,
            )
            .await
            .unwrap();

        queue.put(1, None).await.unwrap();
        queue.put(2, None).await.unwrap();
        queue.put(3, None).await.unwrap();
        queue.join().await;

        assert_eq!(processed.load(Ordering::SeqCst), 3);
        assert_eq!(queue.metrics().processed, 3);
    }

    #[tokio::test]
    async fn a_failing_worker_invokes_the_error_handler() {
        let queue: BoundedWorkQueue<i32> = BoundedWorkQueue::new(config(5));
        queue.start().await;

        let handled = Arc::new(StdAtomicUsize::new(0));
        let handled_cb = Arc::clone(&handled);

        queue
            .start_workers(
                |item: &i32| {
                    let item = *item;
                    async move { if item < 0 { Err(format!("bad item {item}")) } else { Ok(()) } }
                },
                1,
                Some(move |_error: String, _item: &i32| {
                    handled_cb.fetch_add(1, Ordering::SeqCst);
                    std::future::ready(())
                }),
            )
            .await
            .unwrap();

        queue.put(1, None).await.unwrap();
        queue.put(-1, None).await.unwrap();
        queue.join().await;

        assert_eq!(handled.load(Ordering::SeqCst), 1);
        let metrics = queue.metrics();
        assert_eq!(metrics.errored, 1);
        assert_eq!(metrics.processed, 1);
        // join() returned, so outstanding is 0: enqueued = processed + errored + outstanding.
        assert_eq!(metrics.enqueued, metrics.processed + metrics.errored);
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_drains_workers() {
        let queue: BoundedWorkQueue<i32> = BoundedWorkQueue::new(config(5));
        queue.start().await;
        queue
            .start_workers(|_: &i32| async { Ok::<(), String>(()) }, 1, None::<fn(String, &i32) -> std::future::Ready<()>>)
            .await
            .unwrap();

        queue.put(1, None).await.unwrap();
        queue.stop(Some(Duration::from_millis(200))).await;
        assert_eq!(queue.status().await, QueueStatus::Stopped);
        assert_eq!(queue.worker_count().await, 0);

        queue.stop(None).await;
        assert_eq!(queue.status().await, QueueStatus::Stopped);
    }
}
