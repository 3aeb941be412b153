//! Validated endpoint configuration and its lazily-built transport client,
//! per §4.10.

mod config;
mod endpoint;
mod error;

pub use config::{EndpointConfig, EndpointConfigBuilder, HttpConfig, SdkConfig, TransportKind};
pub use endpoint::{Endpoint, EndpointClient};
pub use error::EndpointError;
