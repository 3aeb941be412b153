use thiserror::Error;

/// Errors raised by [`crate::HttpTransportClient`] and [`crate::SdkAdapter`]
/// implementations.
///
/// Every variant carries enough context to reconstruct what the caller saw:
/// an HTTP status code where one exists, the raw response body, and a
/// human-readable message. Mapping from a `reqwest::Response` lives in
/// [`TransportError::from_response`].
#[derive(Debug, Error, Clone)]
pub enum TransportError {
    #[error("connection error: {message}")]
    Connection { message: String },

    #[error("request timed out: {message}")]
    Timeout { message: String },

    #[error("authentication failed ({status}): {message}")]
    Authentication { status: u16, body: Option<String>, message: String },

    #[error("resource not found ({status}): {message}")]
    NotFound { status: u16, body: Option<String>, message: String },

    #[error("rate limited ({status}): {message}")]
    RateLimit { status: u16, body: Option<String>, message: String, retry_after: Option<f64> },

    #[error("server error ({status}): {message}")]
    Server { status: u16, body: Option<String>, message: String },

    #[error("api error ({status}): {message}")]
    Api { status: u16, body: Option<String>, message: String },

    #[error("sdk call failed: {message}")]
    Sdk { message: String, cause: Option<String> },
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, TransportError::Connection { .. })
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, TransportError::RateLimit { .. })
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, TransportError::Server { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Authentication { status, .. }
            | TransportError::NotFound { status, .. }
            | TransportError::RateLimit { status, .. }
            | TransportError::Server { status, .. }
            | TransportError::Api { status, .. } => Some(*status),
            TransportError::Connection { .. } | TransportError::Timeout { .. } | TransportError::Sdk { .. } => None,
        }
    }

    pub fn retry_after(&self) -> Option<f64> {
        match self {
            TransportError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Maps a non-2xx response onto the status-to-error taxonomy: 401 ->
    /// authentication, 404 -> not-found, 429 -> rate-limit (parsing
    /// `Retry-After` as seconds), 5xx -> server, other 4xx -> generic api
    /// error.
    pub fn from_status(status: u16, body: Option<String>, retry_after: Option<f64>) -> Self {
        let message = body.clone().unwrap_or_else(|| format!("http status {status}"));
        match status {
            401 => TransportError::Authentication { status, body, message },
            404 => TransportError::NotFound { status, body, message },
            429 => TransportError::RateLimit { status, body, message, retry_after },
            500..=599 => TransportError::Server { status, body, message },
            _ => TransportError::Api { status, body, message },
        }
    }

    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout { message: err.to_string() }
        } else {
            TransportError::Connection { message: err.to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_401_maps_to_authentication() {
        let err = TransportError::from_status(401, Some("bad key".into()), None);
        assert!(matches!(err, TransportError::Authentication { .. }));
        assert_eq!(err.status_code(), Some(401));
    }

    #[test]
    fn status_404_maps_to_not_found() {
        let err = TransportError::from_status(404, None, None);
        assert!(matches!(err, TransportError::NotFound { .. }));
    }

    #[test]
    fn status_429_carries_retry_after() {
        let err = TransportError::from_status(429, None, Some(30.0));
        assert!(err.is_rate_limit());
        assert_eq!(err.retry_after(), Some(30.0));
    }

    #[test]
    fn status_5xx_maps_to_server_error() {
        let err = TransportError::from_status(503, None, None);
        assert!(err.is_server_error());
    }

    #[test]
    fn other_4xx_maps_to_generic_api_error() {
        let err = TransportError::from_status(418, None, None);
        assert!(matches!(err, TransportError::Api { .. }));
    }

    #[test]
    fn non_rate_limit_errors_have_no_retry_after() {
        let err = TransportError::from_status(500, None, None);
        assert_eq!(err.retry_after(), None);
    }
}
