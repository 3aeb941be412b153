use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EndpointError;

/// Which kind of client `get_client()` builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportKind {
    Http,
    Sdk,
}

/// HTTP-specific endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub method: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { method: "POST".to_string() }
    }
}

/// SDK-specific endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    pub sdk_provider_name: String,
    pub default_sdk_method_name: Option<String>,
}

/// Validated configuration for an [`crate::Endpoint`]. Round-trips through
/// `serde_json` so a deployment's endpoint table can live in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub transport_type: TransportKind,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub default_headers: HashMap<String, String>,
    pub client_kwargs: HashMap<String, Value>,
    pub default_request_kwargs: Map<String, Value>,
    pub http_config: Option<HttpConfig>,
    pub sdk_config: Option<SdkConfig>,
}

impl EndpointConfig {
    pub fn builder(name: impl Into<String>, transport_type: TransportKind) -> EndpointConfigBuilder {
        EndpointConfigBuilder::new(name, transport_type)
    }
}

pub struct EndpointConfigBuilder {
    name: String,
    transport_type: TransportKind,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
    default_headers: HashMap<String, String>,
    client_kwargs: HashMap<String, Value>,
    default_request_kwargs: Map<String, Value>,
    http_config: Option<HttpConfig>,
    sdk_config: Option<SdkConfig>,
}

impl EndpointConfigBuilder {
    pub fn new(name: impl Into<String>, transport_type: TransportKind) -> Self {
        Self {
            name: name.into(),
            transport_type,
            base_url: None,
            api_key: None,
            timeout: Duration::from_secs(60),
            default_headers: HashMap::new(),
            client_kwargs: HashMap::new(),
            default_request_kwargs: Map::new(),
            http_config: None,
            sdk_config: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn default_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn client_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.client_kwargs.insert(key.into(), value);
        self
    }

    pub fn default_request_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.default_request_kwargs.insert(key.into(), value);
        self
    }

    pub fn http_config(mut self, http_config: HttpConfig) -> Self {
        self.http_config = Some(http_config);
        self
    }

    pub fn sdk_config(mut self, sdk_config: SdkConfig) -> Self {
        self.sdk_config = Some(sdk_config);
        self
    }

    pub fn build(self) -> Result<EndpointConfig, EndpointError> {
        if self.transport_type == TransportKind::Http && self.base_url.is_none() {
            return Err(EndpointError::MissingBaseUrl);
        }
        if self.transport_type == TransportKind::Sdk
            && self.sdk_config.as_ref().map(|c| c.sdk_provider_name.is_empty()).unwrap_or(true)
        {
            return Err(EndpointError::MissingSdkConfig);
        }
        Ok(EndpointConfig {
            name: self.name,
            transport_type: self.transport_type,
            base_url: self.base_url,
            api_key: self.api_key,
            timeout: self.timeout,
            default_headers: self.default_headers,
            client_kwargs: self.client_kwargs,
            default_request_kwargs: self.default_request_kwargs,
            http_config: self.http_config,
            sdk_config: self.sdk_config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_endpoint_without_base_url_is_rejected() {
        let result = EndpointConfig::builder("completions", TransportKind::Http).build();
        assert!(matches!(result.unwrap_err(), EndpointError::MissingBaseUrl));
    }

    #[test]
    fn sdk_endpoint_without_provider_is_rejected() {
        let result = EndpointConfig::builder("chat", TransportKind::Sdk).build();
        assert!(matches!(result.unwrap_err(), EndpointError::MissingSdkConfig));
    }

    #[test]
    fn valid_http_config_builds() {
        let config = EndpointConfig::builder("completions", TransportKind::Http)
            .base_url("https://api.example.com")
            .http_config(HttpConfig::default())
            .build()
            .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.http_config.unwrap().method, "POST");
    }

    #[test]
    fn valid_sdk_config_builds() {
        let config = EndpointConfig::builder("chat", TransportKind::Sdk)
            .sdk_config(SdkConfig { sdk_provider_name: "openai".into(), default_sdk_method_name: Some("chat.completions.create".into()) })
            .build()
            .unwrap();
        assert_eq!(config.sdk_config.unwrap().sdk_provider_name, "openai");
    }

    #[test]
    fn round_trips_through_serde_json_without_loss() {
        let config = EndpointConfig::builder("completions", TransportKind::Http)
            .base_url("https://api.example.com")
            .api_key("secret")
            .timeout(Duration::from_secs(30))
            .default_header("x-request-source", "netdispatch")
            .default_request_kwarg("model", Value::String("gpt-4".into()))
            .http_config(HttpConfig::default())
            .build()
            .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        let restored: EndpointConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.name, config.name);
        assert_eq!(restored.transport_type, config.transport_type);
        assert_eq!(restored.base_url, config.base_url);
        assert_eq!(restored.api_key, config.api_key);
        assert_eq!(restored.timeout, config.timeout);
        assert_eq!(restored.default_headers, config.default_headers);
        assert_eq!(restored.default_request_kwargs, config.default_request_kwargs);
        assert_eq!(restored.http_config.unwrap().method, config.http_config.unwrap().method);
    }
}
