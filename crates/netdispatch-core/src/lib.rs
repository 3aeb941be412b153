//! Shared infrastructure for netdispatch.
//!
//! This crate provides the pieces every other netdispatch crate builds on:
//! - an event/listener system used by the rate limiter, circuit breaker and
//!   retry policy for observability
//! - the [`RequestEvent`] lifecycle object returned to callers of the
//!   invocation facade

pub mod events;
pub mod request_event;

pub use events::{DispatchEvent, EventListener, EventListeners, FnListener};
pub use request_event::{RequestDescriptor, RequestEvent, RequestStatus};
