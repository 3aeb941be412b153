use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};

use netdispatch_core::RequestEvent;
use netdispatch_endpoint::{Endpoint, EndpointClient};
use netdispatch_executor::{Executor, SubmitOptions};
use netdispatch_transport::RequestOptions;

use crate::error::NetdispatchError;

/// Per-call overrides for [`Facade::invoke`], per §4.12.
#[derive(Default)]
pub struct InvokeOptions {
    pub http_path: Option<String>,
    pub http_method: Option<String>,
    pub sdk_method_name: Option<String>,
    pub tokens_needed: u32,
    pub metadata: HashMap<String, Value>,
    pub headers: Option<HashMap<String, String>>,
    pub extra: Map<String, Value>,
}

/// Resolves an endpoint's transport, builds the closure the executor will
/// run, and submits it. This is the crate's sole public entry point.
pub struct Facade {
    endpoint: Arc<Endpoint>,
    executor: Arc<Executor>,
}

impl Facade {
    pub fn new(endpoint: Arc<Endpoint>, executor: Arc<Executor>) -> Self {
        Self { endpoint, executor }
    }

    pub async fn invoke(&self, payload: Value, options: InvokeOptions) -> Result<Arc<RequestEvent>, NetdispatchError> {
        let client = self.endpoint.get_client().await?;

        match client {
            EndpointClient::Http(http) => {
                let config = self.endpoint.config();
                let method = options
                    .http_method
                    .clone()
                    .or_else(|| config.http_config.as_ref().map(|c| c.method.clone()))
                    .unwrap_or_else(|| "POST".to_string());
                let path = options.http_path.clone().ok_or(NetdispatchError::MissingHttpPath)?;

                let mut json_body = None;
                let mut query = None;
                if is_get_family(&method) {
                    query = Some(flatten_to_query(&payload));
                } else {
                    let mut body = merge_kwargs(&config.default_request_kwargs, &options.extra);
                    if let Value::Object(map) = &payload {
                        for (k, v) in map {
                            body.insert(k.clone(), v.clone());
                        }
                    }
                    json_body = Some(Value::Object(body));
                }

                let base_url = config.base_url.clone().unwrap_or_default();
                let endpoint_url = format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'));
                let headers = options.headers.clone().unwrap_or_default();

                let request_options = RequestOptions { headers: headers.clone(), query, json_body: json_body.clone() };
                let request_path = path.clone();
                let request_method = method.clone();
                let http = Arc::clone(&http);
                let call = move || async move {
                    let reqwest_method = reqwest::Method::from_str(&request_method).map_err(|e| e.to_string())?;
                    http.request(reqwest_method, &request_path, request_options).await.map_err(|e| e.to_string())
                };

                self.executor
                    .submit(
                        call,
                        SubmitOptions {
                            endpoint_url: Some(endpoint_url),
                            method: Some(method),
                            headers: Some(headers),
                            payload: Some(payload),
                            tokens_needed: options.tokens_needed,
                            metadata: options.metadata,
                        },
                    )
                    .await
                    .map_err(Into::into)
            }
            EndpointClient::Sdk(adapter) => {
                let config = self.endpoint.config();
                let sdk_config = config.sdk_config.as_ref().ok_or(NetdispatchError::UnsupportedTransport)?;
                let method_name = options
                    .sdk_method_name
                    .clone()
                    .or_else(|| sdk_config.default_sdk_method_name.clone())
                    .ok_or(NetdispatchError::MissingSdkMethodName)?;

                let mut kwargs = merge_kwargs(&config.default_request_kwargs, &options.extra);
                match &payload {
                    Value::Object(map) => {
                        for (k, v) in map {
                            kwargs.insert(k.clone(), v.clone());
                        }
                    }
                    Value::Null => {}
                    other => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("non-mapping payload passed to sdk call {method_name}, wrapping as a single argument");
                        kwargs.insert("value".to_string(), other.clone());
                    }
                }

                let endpoint_url = format!("sdk://{}/{}", sdk_config.sdk_provider_name, method_name);
                let adapter = Arc::clone(&adapter);
                let call_method_name = method_name.clone();
                let call = move || async move { adapter.call(&call_method_name, kwargs).await.map_err(|e| e.to_string()) };

                self.executor
                    .submit(
                        call,
                        SubmitOptions {
                            endpoint_url: Some(endpoint_url),
                            method: Some("SDK_CALL".to_string()),
                            headers: None,
                            payload: Some(payload),
                            tokens_needed: options.tokens_needed,
                            metadata: options.metadata,
                        },
                    )
                    .await
                    .map_err(Into::into)
            }
        }
    }
}

fn is_get_family(method: &str) -> bool {
    method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD") || method.eq_ignore_ascii_case("DELETE")
}

fn merge_kwargs(defaults: &Map<String, Value>, extra: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (k, v) in extra {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

fn flatten_to_query(payload: &Value) -> Vec<(String, String)> {
    match payload {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }))
            .collect(),
        Value::Null => Vec::new(),
        other => vec![("payload".to_string(), other.to_string())],
    }
}
