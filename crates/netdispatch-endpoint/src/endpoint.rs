use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;

use netdispatch_transport::{HttpClientConfig, HttpTransportClient, SdkAdapter, SdkAdapterConfig, SdkAdapterFactory};

use crate::config::{EndpointConfig, TransportKind};
use crate::error::EndpointError;

/// The concrete client built for an endpoint, cached after first
/// construction. Cloning is cheap: both variants are reference-counted
/// handles onto the same underlying connection pool or adapter.
#[derive(Clone)]
pub enum EndpointClient {
    Http(Arc<HttpTransportClient>),
    Sdk(Arc<dyn SdkAdapter>),
}

impl EndpointClient {
    pub fn as_http(&self) -> Option<&Arc<HttpTransportClient>> {
        match self {
            EndpointClient::Http(client) => Some(client),
            EndpointClient::Sdk(_) => None,
        }
    }

    pub fn as_sdk(&self) -> Option<&Arc<dyn SdkAdapter>> {
        match self {
            EndpointClient::Sdk(adapter) => Some(adapter),
            EndpointClient::Http(_) => None,
        }
    }
}

/// A validated endpoint config plus its lazily-constructed client.
///
/// `get_client()` is cached-first: the first caller builds the client and
/// stores it, every later caller (including ones that arrive concurrently
/// during construction) observes the same instance. This relies on
/// [`tokio::sync::OnceCell::get_or_try_init`], which already guarantees
/// exactly one initializer runs under concurrent first-time callers.
pub struct Endpoint {
    config: EndpointConfig,
    factory: SdkAdapterFactory,
    client: OnceCell<EndpointClient>,
    closed: AtomicBool,
}

impl Endpoint {
    pub fn new(config: EndpointConfig) -> Self {
        Self::with_sdk_factory(config, SdkAdapterFactory::new())
    }

    pub fn with_sdk_factory(config: EndpointConfig, factory: SdkAdapterFactory) -> Self {
        Self { config, factory, client: OnceCell::new(), closed: AtomicBool::new(false) }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns the cached client, building it on first call. Fails if the
    /// endpoint has already been closed.
    pub async fn get_client(&self) -> Result<EndpointClient, EndpointError> {
        if self.is_closed() {
            return Err(EndpointError::Closed);
        }
        let client = self
            .client
            .get_or_try_init(|| async {
                match self.config.transport_type {
                    TransportKind::Http => {
                        let base_url = self.config.base_url.clone().ok_or(EndpointError::MissingBaseUrl)?;
                        let mut http_config = HttpClientConfig::new(base_url).with_timeout(self.config.timeout);
                        if let Some(key) = &self.config.api_key {
                            http_config = http_config.with_api_key(key.clone());
                        }
                        for (k, v) in &self.config.default_headers {
                            http_config = http_config.with_header(k.clone(), v.clone());
                        }
                        let client = HttpTransportClient::new(http_config)?;
                        Ok::<EndpointClient, EndpointError>(EndpointClient::Http(Arc::new(client)))
                    }
                    TransportKind::Sdk => {
                        let sdk_config = self.config.sdk_config.as_ref().ok_or(EndpointError::MissingSdkConfig)?;
                        let adapter_config = SdkAdapterConfig {
                            api_key: self.config.api_key.clone(),
                            client_kwargs: self.config.client_kwargs.clone(),
                        };
                        let adapter = self
                            .factory
                            .create(&sdk_config.sdk_provider_name, adapter_config)
                            .map_err(|_| EndpointError::UnknownSdkProvider(sdk_config.sdk_provider_name.clone()))?;
                        Ok(EndpointClient::Sdk(Arc::from(adapter)))
                    }
                }
            })
            .await?;
        Ok(client.clone())
    }

    /// Releases the cached client, preferring an async close (both variants
    /// here are async) and marks the endpoint closed. Idempotent: later
    /// calls observe the already-closed state and return immediately.
    pub async fn close(&self) -> Result<(), EndpointError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(client) = self.client.get() {
            match client {
                EndpointClient::Http(client) => client.close(),
                EndpointClient::Sdk(adapter) => adapter.close().await,
            }
        }
        Ok(())
    }
}
