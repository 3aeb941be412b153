//! Pooled HTTP transport client and vendor SDK adapter registry, per §4.8
//! and §4.9.

mod client;
mod error;
mod sdk;

pub use client::{HttpClientConfig, HttpTransportClient, RequestOptions};
pub use error::TransportError;
pub use sdk::{AnthropicAdapter, OpenAiAdapter, SdkAdapter, SdkAdapterConfig, SdkAdapterFactory};
