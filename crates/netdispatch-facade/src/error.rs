use thiserror::Error;

use netdispatch_endpoint::EndpointError;
use netdispatch_executor::ExecutorError;
use netdispatch_transport::TransportError;

/// The top-level error taxonomy surfaced at the crate boundary, per §6 and
/// §7: every narrower crate's error composed into one enum, plus the
/// facade's own synchronous construction/dispatch failures.
#[derive(Debug, Error, Clone)]
pub enum NetdispatchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("http endpoint invoked without an http_path")]
    MissingHttpPath,

    #[error("sdk endpoint invoked without an sdk_method_name and no endpoint default is configured")]
    MissingSdkMethodName,

    #[error("endpoint transport discriminant is not supported by this operation")]
    UnsupportedTransport,
}

impl NetdispatchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, NetdispatchError::Transport(e) if e.is_timeout())
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, NetdispatchError::Transport(e) if e.is_rate_limit())
    }

    pub fn is_queue_state_error(&self) -> bool {
        matches!(self, NetdispatchError::Executor(e) if e.is_not_running())
    }

    pub fn retry_after(&self) -> Option<f64> {
        match self {
            NetdispatchError::Transport(e) => e.retry_after(),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetdispatchError::Transport(e) => e.status_code(),
            _ => None,
        }
    }
}
