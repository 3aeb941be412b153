use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::client::{HttpClientConfig, HttpTransportClient, RequestOptions};
use crate::error::TransportError;

/// Configuration passed to an [`SdkAdapter`] constructor: credentials and
/// vendor-specific construction kwargs, mirroring `BaseSDKAdapter.__init__`.
#[derive(Debug, Clone, Default)]
pub struct SdkAdapterConfig {
    pub api_key: Option<String>,
    pub client_kwargs: HashMap<String, Value>,
}

/// Uniform interface over a vendor SDK: `call(method_path, kwargs)` resolves
/// a dotted method path against the adapter's own method table (Rust has no
/// attribute reflection, so each adapter enumerates what it supports) and
/// returns the parsed result.
///
/// Adapters mirror the HTTP client's acquire/release lifecycle: `close` is
/// idempotent and further calls after it fail.
#[async_trait]
pub trait SdkAdapter: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn call(&self, method_path: &str, kwargs: Map<String, Value>) -> Result<Value, TransportError>;

    async fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Thin HTTP-backed adapter for OpenAI's chat completions endpoint.
///
/// There is no official async Rust SDK for OpenAI in this workspace's
/// dependency set, so the adapter speaks the vendor's REST API directly
/// through an inner [`HttpTransportClient`], the same way the rest of this
/// crate talks to any other HTTP API.
pub struct OpenAiAdapter {
    client: HttpTransportClient,
}

impl OpenAiAdapter {
    pub fn new(config: SdkAdapterConfig) -> Result<Self, TransportError> {
        let mut http_config = HttpClientConfig::new("https://api.openai.com");
        if let Some(key) = config.api_key {
            http_config = http_config.with_api_key(key);
        }
        Ok(Self { client: HttpTransportClient::new(http_config)? })
    }
}

#[async_trait]
impl SdkAdapter for OpenAiAdapter {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    async fn call(&self, method_path: &str, kwargs: Map<String, Value>) -> Result<Value, TransportError> {
        match method_path {
            "chat.completions.create" => {
                self.client
                    .request(reqwest::Method::POST, "v1/chat/completions", RequestOptions {
                        json_body: Some(Value::Object(kwargs)),
                        ..Default::default()
                    })
                    .await
            }
            "embeddings.create" => {
                self.client
                    .request(reqwest::Method::POST, "v1/embeddings", RequestOptions {
                        json_body: Some(Value::Object(kwargs)),
                        ..Default::default()
                    })
                    .await
            }
            other => Err(TransportError::Sdk { message: format!("openai adapter has no method `{other}`"), cause: None }),
        }
        .map_err(|e| match e {
            TransportError::Sdk { .. } => e,
            other => TransportError::Sdk { message: format!("openai sdk call failed: {other}"), cause: Some(other.to_string()) },
        })
    }

    async fn close(&self) {
        self.client.close();
    }

    fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}

/// Thin HTTP-backed adapter for Anthropic's messages endpoint.
pub struct AnthropicAdapter {
    client: HttpTransportClient,
}

impl AnthropicAdapter {
    pub fn new(config: SdkAdapterConfig) -> Result<Self, TransportError> {
        let mut http_config = HttpClientConfig::new("https://api.anthropic.com").with_header("anthropic-version", "2023-06-01");
        if let Some(key) = config.api_key {
            http_config = http_config.with_header("x-api-key", key);
        }
        Ok(Self { client: HttpTransportClient::new(http_config)? })
    }
}

#[async_trait]
impl SdkAdapter for AnthropicAdapter {
    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    async fn call(&self, method_path: &str, kwargs: Map<String, Value>) -> Result<Value, TransportError> {
        match method_path {
            "messages.create" => {
                self.client
                    .request(reqwest::Method::POST, "v1/messages", RequestOptions { json_body: Some(Value::Object(kwargs)), ..Default::default() })
                    .await
            }
            other => Err(TransportError::Sdk { message: format!("anthropic adapter has no method `{other}`"), cause: None }),
        }
        .map_err(|e| match e {
            TransportError::Sdk { .. } => e,
            other => TransportError::Sdk { message: format!("anthropic sdk call failed: {other}"), cause: Some(other.to_string()) },
        })
    }

    async fn close(&self) {
        self.client.close();
    }

    fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}

type AdapterConstructor = dyn Fn(SdkAdapterConfig) -> Result<Box<dyn SdkAdapter>, TransportError> + Send + Sync;

/// Case-insensitive provider-name registry, populated at construction (no
/// global mutable registry). Unknown keys are a construction error.
pub struct SdkAdapterFactory {
    constructors: HashMap<String, Arc<AdapterConstructor>>,
}

impl SdkAdapterFactory {
    /// Registry pre-populated with the built-in `openai` and `anthropic`
    /// adapters.
    pub fn new() -> Self {
        let mut factory = Self { constructors: HashMap::new() };
        factory.register("openai", |cfg| Ok(Box::new(OpenAiAdapter::new(cfg)?) as Box<dyn SdkAdapter>));
        factory.register("anthropic", |cfg| Ok(Box::new(AnthropicAdapter::new(cfg)?) as Box<dyn SdkAdapter>));
        factory
    }

    pub fn register<F>(&mut self, provider_name: &str, constructor: F)
    where
        F: Fn(SdkAdapterConfig) -> Result<Box<dyn SdkAdapter>, TransportError> + Send + Sync + 'static,
    {
        self.constructors.insert(provider_name.to_lowercase(), Arc::new(constructor));
    }

    pub fn create(&self, provider_name: &str, config: SdkAdapterConfig) -> Result<Box<dyn SdkAdapter>, TransportError> {
        match self.constructors.get(&provider_name.to_lowercase()) {
            Some(ctor) => ctor(config),
            None => Err(TransportError::Sdk { message: format!("unknown sdk provider: {provider_name}"), cause: None }),
        }
    }
}

impl Default for SdkAdapterFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_resolves_known_providers_case_insensitively() {
        let factory = SdkAdapterFactory::new();
        let adapter = factory.create("OpenAI", SdkAdapterConfig::default()).unwrap();
        assert_eq!(adapter.provider_name(), "openai");
    }

    #[test]
    fn factory_rejects_unknown_provider() {
        let factory = SdkAdapterFactory::new();
        let result = factory.create("not-a-real-vendor", SdkAdapterConfig::default());
        assert!(matches!(result, Err(TransportError::Sdk { .. })));
    }

    #[tokio::test]
    async fn unsupported_method_path_is_an_sdk_error() {
        let adapter = OpenAiAdapter::new(SdkAdapterConfig::default()).unwrap();
        let err = adapter.call("images.generate", Map::new()).await.unwrap_err();
        assert!(matches!(err, TransportError::Sdk { .. }));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let adapter = OpenAiAdapter::new(SdkAdapterConfig::default()).unwrap();
        adapter.close().await;
        adapter.close().await;
        assert!(adapter.is_closed());
    }
}
