//! The per-request lifecycle object returned by the invocation facade.
//!
//! Grounded on the original implementation's `network/events.py`
//! (`NetworkRequestEvent`/`RequestStatus`): a mutable record shared between
//! the caller and the worker that processes the request, carrying status,
//! timing, the request descriptor, the eventual result or error, and an
//! append-only log.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle status of a [`RequestEvent`].
///
/// Transitions are monotonic along `Pending -> Queued -> Processing ->
/// Calling -> Completed` or `.. -> Failed`; `Cancelled` may supersede any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RequestStatus {
    Pending = 0,
    Queued = 1,
    Processing = 2,
    Calling = 3,
    Completed = 4,
    Failed = 5,
    Cancelled = 6,
}

impl RequestStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => RequestStatus::Pending,
            1 => RequestStatus::Queued,
            2 => RequestStatus::Processing,
            3 => RequestStatus::Calling,
            4 => RequestStatus::Completed,
            5 => RequestStatus::Failed,
            _ => RequestStatus::Cancelled,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Completed | RequestStatus::Failed | RequestStatus::Cancelled
        )
    }
}

/// Endpoint URL or SDK method path, HTTP method (or `SDK_CALL`), headers,
/// opaque payload and the number of API tokens the call will consume.
#[derive(Debug, Clone, Default)]
pub struct RequestDescriptor {
    pub endpoint_url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub payload: Option<Value>,
    pub num_api_tokens_needed: u32,
}

#[derive(Debug, Default)]
struct MutableState {
    descriptor: RequestDescriptor,
    response_status_code: Option<u16>,
    response_headers: Option<HashMap<String, String>>,
    response_body: Option<Value>,
    error_type: Option<String>,
    error_message: Option<String>,
    error_details: Option<String>,
    queued_at: Option<DateTime<Utc>>,
    processing_started_at: Option<DateTime<Utc>>,
    call_started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    logs: Vec<(DateTime<Utc>, String)>,
    metadata: HashMap<String, Value>,
}

/// The mutable lifecycle handle returned by `invoke`, shared by the caller
/// and the worker that drives the request to completion.
///
/// Writes are made only by the owning worker (and the closure it runs);
/// reads are safe from any thread because the status is a lock-free atomic
/// and every other field lives behind a mutex guarding append-only or
/// set-once mutation.
#[derive(Debug)]
pub struct RequestEvent {
    request_id: Uuid,
    created_at: DateTime<Utc>,
    status: AtomicU8,
    state: Mutex<MutableState>,
}

impl RequestEvent {
    /// Creates a new event in [`RequestStatus::Pending`].
    pub fn new(descriptor: RequestDescriptor, metadata: HashMap<String, Value>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            created_at: Utc::now(),
            status: AtomicU8::new(RequestStatus::Pending as u8),
            state: Mutex::new(MutableState {
                descriptor,
                metadata,
                ..Default::default()
            }),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> RequestStatus {
        RequestStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn descriptor(&self) -> RequestDescriptor {
        self.state.lock().unwrap().descriptor.clone()
    }

    pub fn queued_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().queued_at
    }

    pub fn processing_started_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().processing_started_at
    }

    pub fn call_started_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().call_started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().completed_at
    }

    pub fn response(&self) -> Option<(u16, Option<HashMap<String, String>>, Option<Value>)> {
        let state = self.state.lock().unwrap();
        state
            .response_status_code
            .map(|code| (code, state.response_headers.clone(), state.response_body.clone()))
    }

    pub fn error(&self) -> Option<(String, String, Option<String>)> {
        let state = self.state.lock().unwrap();
        state.error_type.clone().map(|kind| {
            (
                kind,
                state.error_message.clone().unwrap_or_default(),
                state.error_details.clone(),
            )
        })
    }

    pub fn logs(&self) -> Vec<(DateTime<Utc>, String)> {
        self.state.lock().unwrap().logs.clone()
    }

    pub fn metadata(&self) -> HashMap<String, Value> {
        self.state.lock().unwrap().metadata.clone()
    }

    /// Transitions to `new_status`, recording the corresponding timestamp
    /// the first time it is reached and appending a log entry on change.
    pub fn update_status(&self, new_status: RequestStatus) {
        let old = self.status();
        self.status.store(new_status as u8, Ordering::Release);
        let now = Utc::now();

        let mut state = self.state.lock().unwrap();
        if old != new_status {
            state
                .logs
                .push((now, format!("status changed from {old:?} to {new_status:?}")));
        }

        match new_status {
            RequestStatus::Queued if state.queued_at.is_none() => state.queued_at = Some(now),
            RequestStatus::Processing if state.processing_started_at.is_none() => {
                state.processing_started_at = Some(now)
            }
            RequestStatus::Calling if state.call_started_at.is_none() => {
                state.call_started_at = Some(now)
            }
            RequestStatus::Completed | RequestStatus::Failed | RequestStatus::Cancelled
                if state.completed_at.is_none() =>
            {
                state.completed_at = Some(now)
            }
            _ => {}
        }
    }

    /// Records a successful result and transitions to [`RequestStatus::Completed`].
    pub fn set_result(
        &self,
        status_code: u16,
        headers: Option<HashMap<String, String>>,
        body: Option<Value>,
    ) {
        {
            let mut state = self.state.lock().unwrap();
            state.response_status_code = Some(status_code);
            state.response_headers = headers;
            state.response_body = body;
            state
                .logs
                .push((Utc::now(), format!("call completed with status code: {status_code}")));
        }
        self.update_status(RequestStatus::Completed);
    }

    /// Records a failure and transitions to [`RequestStatus::Failed`].
    pub fn set_error(&self, error_type: impl Into<String>, message: impl Into<String>, details: Option<String>) {
        let error_type = error_type.into();
        let message = message.into();
        {
            let mut state = self.state.lock().unwrap();
            state.error_type = Some(error_type.clone());
            state.error_message = Some(message.clone());
            state.error_details = details;
            state
                .logs
                .push((Utc::now(), format!("call failed: {error_type} - {message}")));
        }
        self.update_status(RequestStatus::Failed);
    }

    pub fn add_log(&self, message: impl Into<String>) {
        self.state.lock().unwrap().logs.push((Utc::now(), message.into()));
    }
}
