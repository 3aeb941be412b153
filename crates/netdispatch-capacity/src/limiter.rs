use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use netdispatch_core::EventListeners;

use crate::config::CapacityConfig;
use crate::error::CapacityError;
use crate::events::CapacityEvent;

/// Bounds the number of calls that may run concurrently, per §4.4.
///
/// Grounded on the teacher's bulkhead semaphore wrapping, adapted from a
/// `tower::Layer` around a typed `Service` to a plain guard returned around
/// an arbitrary future.
#[derive(Clone)]
pub struct CapacityLimiter {
    semaphore: Arc<Semaphore>,
    name: Arc<str>,
    max_wait_duration: Option<std::time::Duration>,
    event_listeners: Arc<EventListeners<CapacityEvent>>,
}

/// Holds a permit for the duration of a call; emits `Finished`/`Failed`
/// events when dropped or when [`CapacityGuard::finish`] is called
/// explicitly with a success flag.
pub struct CapacityGuard {
    _permit: OwnedSemaphorePermit,
    name: Arc<str>,
    started_at: Instant,
    event_listeners: Arc<EventListeners<CapacityEvent>>,
}

impl CapacityGuard {
    fn emit_finished(&self) {
        self.event_listeners.emit(&CapacityEvent::Finished {
            name: self.name.to_string(),
            duration: self.started_at.elapsed(),
            timestamp: Instant::now(),
        });
    }

    /// Marks the call as having failed, per the caller's own judgment of
    /// failure (the capacity limiter itself has no notion of success).
    pub fn mark_failed(&self) {
        self.event_listeners.emit(&CapacityEvent::Failed {
            name: self.name.to_string(),
            duration: self.started_at.elapsed(),
            timestamp: Instant::now(),
        });
    }
}

impl Drop for CapacityGuard {
    fn drop(&mut self) {
        self.emit_finished();
    }
}

impl CapacityLimiter {
    pub fn from_config(config: CapacityConfig) -> Result<Self, CapacityError> {
        if config.max_concurrent_calls == 0 {
            return Err(CapacityError::InvalidMaxConcurrentCalls(0));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_calls)),
            name: config.name.into(),
            max_wait_duration: config.max_wait_duration,
            event_listeners: Arc::new(config.event_listeners),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of permits currently available (i.e. not held by an in-flight
    /// call).
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Acquires a permit, waiting up to `max_wait_duration` if configured.
    /// Returns [`CapacityError::Rejected`] if the wait elapses, or
    /// [`CapacityError::TimedOut`] on the same condition when a wait
    /// duration was explicitly set (surfaced distinctly so callers can tell
    /// "no capacity" from "took too long" if they care to).
    pub async fn acquire(&self) -> Result<CapacityGuard, CapacityError> {
        let permit = match self.max_wait_duration {
            Some(max_wait) => {
                match tokio::time::timeout(max_wait, Arc::clone(&self.semaphore).acquire_owned()).await {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_closed)) => {
                        return Err(CapacityError::Rejected(self.max_concurrent_calls()));
                    }
                    Err(_elapsed) => {
                        self.event_listeners.emit(&CapacityEvent::Rejected {
                            name: self.name.to_string(),
                            timestamp: Instant::now(),
                        });
                        return Err(CapacityError::TimedOut(max_wait));
                    }
                }
            }
            None => Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .map_err(|_closed| CapacityError::Rejected(self.max_concurrent_calls()))?,
        };

        self.event_listeners.emit(&CapacityEvent::Permitted {
            name: self.name.to_string(),
            timestamp: Instant::now(),
        });

        Ok(CapacityGuard {
            _permit: permit,
            name: Arc::clone(&self.name),
            started_at: Instant::now(),
            event_listeners: Arc::clone(&self.event_listeners),
        })
    }

    fn max_concurrent_calls(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Runs `fut` under a permit, marking the call failed if `is_err`
    /// returns true for its result.
    pub async fn execute<F, Fut, T>(&self, is_err: impl Fn(&T) -> bool, fut: F) -> Result<T, CapacityError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let guard = self.acquire().await?;
        let result = fut().await;
        if is_err(&result) {
            guard.mark_failed();
        }
        Ok(result)
    }
}
