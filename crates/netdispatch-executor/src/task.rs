use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use netdispatch_core::RequestEvent;

/// A single transport call result: the decoded JSON body, or a message
/// describing why the call failed.
pub type DispatchOutcome = Result<Value, String>;

type BoxedCall = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = DispatchOutcome> + Send>> + Send>;

/// A submitted unit of work: the event the caller observes, the number of
/// API tokens it needs, and the closure that performs the actual call.
///
/// The closure is `FnOnce`, but [`netdispatch_queue::BoundedWorkQueue`]'s
/// worker callback only ever gets a shared reference to a dequeued item (a
/// single item is, in practice, only ever handed to one worker), so it is
/// wrapped in a `Mutex<Option<_>>` and taken out the first (and only) time
/// the task is run.
pub struct DispatchTask {
    pub event: Arc<RequestEvent>,
    pub tokens_needed: u32,
    call: Mutex<Option<BoxedCall>>,
}

impl DispatchTask {
    pub fn new<F, Fut>(event: Arc<RequestEvent>, tokens_needed: u32, call: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = DispatchOutcome> + Send + 'static,
    {
        let boxed: BoxedCall = Box::new(move || Box::pin(call()));
        Self { event, tokens_needed, call: Mutex::new(Some(boxed)) }
    }

    /// Takes the closure out and runs it. Returns `None` if already run
    /// (should not happen under the queue's single-dequeue guarantee).
    pub async fn run(&self) -> Option<DispatchOutcome> {
        let call = self.call.lock().unwrap().take()?;
        Some(call().await)
    }

    /// Synchronously takes the closure out and invokes it, yielding the
    /// resulting (not-yet-polled) future without requiring a borrow of
    /// `self` for the rest of its lifetime. Returns `None` if already run.
    pub(crate) fn take_call(&self) -> Option<Pin<Box<dyn Future<Output = DispatchOutcome> + Send>>> {
        let call = self.call.lock().unwrap().take()?;
        Some(call())
    }
}
