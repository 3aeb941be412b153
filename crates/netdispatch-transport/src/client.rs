use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::error::TransportError;

/// Static configuration for a pooled HTTP client: base URL, default
/// headers, bearer auth, and the per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub base_url: String,
    pub default_headers: HashMap<String, String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: HashMap::new(),
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

/// Per-request overrides layered on top of [`HttpClientConfig`]'s defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HashMap<String, String>,
    pub query: Option<Vec<(String, String)>>,
    pub json_body: Option<Value>,
}

/// Pooled `reqwest`-backed HTTP client implementing the status-to-error
/// mapping of the network transport contract.
///
/// The underlying `reqwest::Client` is itself pool-backed and `Clone +
/// Send + Sync`; `acquire`/`release` here track only the logical
/// open/closed lifecycle of this handle, not connection pooling, which
/// `reqwest` already does internally.
pub struct HttpTransportClient {
    client: reqwest::Client,
    config: HttpClientConfig,
    closed: AtomicBool,
}

impl HttpTransportClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Connection { message: e.to_string() })?;
        Ok(Self { client, config, closed: AtomicBool::new(false) })
    }

    /// Marks the client acquired; a no-op beyond a closed check, since the
    /// pooled `reqwest::Client` needs no per-call checkout.
    pub fn acquire(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Connection { message: "client is closed".into() });
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Idempotent. `reqwest::Client` has no explicit teardown; this only
    /// flips the closed flag so further requests are rejected.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Issues `method url` with `options` layered over the client's
    /// defaults and parses the response body as JSON on success.
    ///
    /// On a non-2xx response the body is drained into the error so callers
    /// always see what the server said; the `reqwest::Response` is dropped
    /// (and its connection returned to the pool) on every exit path,
    /// including when the caller's future is cancelled mid-await.
    pub async fn request(&self, method: Method, path: &str, options: RequestOptions) -> Result<Value, TransportError> {
        self.acquire()?;

        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.config.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
        };

        let mut builder = self.client.request(method, &url);
        for (k, v) in &self.config.default_headers {
            builder = builder.header(k, v);
        }
        for (k, v) in &options.headers {
            builder = builder.header(k, v);
        }
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        if let Some(query) = &options.query {
            builder = builder.query(query);
        }
        if let Some(body) = &options.json_body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| TransportError::from_reqwest(&e))?;
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await.map_err(|e| TransportError::from_reqwest(&e))?;
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_slice(&bytes)
                .map_err(|e| TransportError::Api { status: status.as_u16(), body: None, message: e.to_string() })
        } else {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok());
            let body = response.text().await.ok();
            Err(TransportError::from_status(status.as_u16(), body, retry_after))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_sets_defaults() {
        let config = HttpClientConfig::new("https://api.example.com").with_api_key("k").with_header("x", "y");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.default_headers.get("x").map(String::as_str), Some("y"));
    }

    #[test]
    fn new_client_is_not_closed() {
        let client = HttpTransportClient::new(HttpClientConfig::new("https://api.example.com")).unwrap();
        assert!(!client.is_closed());
        assert!(client.acquire().is_ok());
    }

    #[test]
    fn close_is_idempotent_and_rejects_further_acquire() {
        let client = HttpTransportClient::new(HttpClientConfig::new("https://api.example.com")).unwrap();
        client.close();
        client.close();
        assert!(client.is_closed());
        assert!(client.acquire().is_err());
    }

    #[tokio::test]
    async fn happy_path_returns_parsed_json_body() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": "success"})))
            .mount(&server)
            .await;

        let client = HttpTransportClient::new(HttpClientConfig::new(server.uri())).unwrap();
        let body = client
            .request(Method::POST, "v1/completions", RequestOptions { json_body: Some(serde_json::json!({"prompt": "hi"})), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(body["result"], "success");
    }

    #[tokio::test]
    async fn status_429_maps_to_rate_limit_with_retry_after() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .mount(&server)
            .await;

        let client = HttpTransportClient::new(HttpClientConfig::new(server.uri())).unwrap();
        let err = client.request(Method::GET, "v1/whatever", RequestOptions::default()).await.unwrap_err();
        assert!(err.is_rate_limit());
        assert_eq!(err.retry_after(), Some(30.0));
    }
}
