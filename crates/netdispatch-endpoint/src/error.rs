use thiserror::Error;

use netdispatch_transport::TransportError;

/// Errors raised by [`crate::EndpointConfig::build`] and
/// [`crate::Endpoint`].
#[derive(Debug, Error, Clone)]
pub enum EndpointError {
    #[error("http endpoint requires a base_url")]
    MissingBaseUrl,

    #[error("sdk endpoint requires sdk_config.sdk_provider_name")]
    MissingSdkConfig,

    #[error("unknown sdk provider: {0}")]
    UnknownSdkProvider(String),

    #[error("endpoint has been closed")]
    Closed,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl EndpointError {
    pub fn is_closed(&self) -> bool {
        matches!(self, EndpointError::Closed)
    }
}
