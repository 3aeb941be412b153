//! End-to-end scenario: an SDK endpoint dispatched through the executor
//! against a stub adapter, asserting the synthesized `sdk://` endpoint URL
//! and `SDK_CALL` method the facade reports for non-HTTP transports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use netdispatch::{
    Endpoint, EndpointConfig, Executor, ExecutorConfig, Facade, InvokeOptions, RequestStatus, SdkAdapter, SdkAdapterFactory, TransportError,
    TransportKind,
};
use netdispatch_endpoint::SdkConfig;

struct StubChatAdapter {
    saw_expected_kwargs: Arc<AtomicBool>,
}

#[async_trait]
impl SdkAdapter for StubChatAdapter {
    fn provider_name(&self) -> &'static str {
        "stub-llm"
    }

    async fn call(&self, method_path: &str, kwargs: Map<String, Value>) -> Result<Value, TransportError> {
        if method_path != "chat.completions.create" {
            return Err(TransportError::Sdk { message: format!("unsupported method {method_path}"), cause: None });
        }
        if kwargs.get("model") == Some(&Value::String("gpt-4".to_string())) && kwargs.contains_key("messages") {
            self.saw_expected_kwargs.store(true, Ordering::SeqCst);
        }
        Ok(serde_json::json!({"result": "success"}))
    }

    async fn close(&self) {}

    fn is_closed(&self) -> bool {
        false
    }
}

#[tokio::test]
async fn happy_path_sdk_completes_with_the_synthesized_endpoint_url() {
    let saw_expected_kwargs = Arc::new(AtomicBool::new(false));
    let adapter_flag = Arc::clone(&saw_expected_kwargs);

    let mut factory = SdkAdapterFactory::new();
    factory.register("stub-llm", move |_config| Ok(Box::new(StubChatAdapter { saw_expected_kwargs: Arc::clone(&adapter_flag) }) as Box<dyn SdkAdapter>));

    let endpoint_config = EndpointConfig::builder("chat", TransportKind::Sdk)
        .api_key("k")
        .sdk_config(SdkConfig { sdk_provider_name: "stub-llm".to_string(), default_sdk_method_name: Some("chat.completions.create".to_string()) })
        .default_request_kwarg("model", serde_json::json!("gpt-4"))
        .build()
        .unwrap();
    let endpoint = Arc::new(Endpoint::with_sdk_factory(endpoint_config, factory));

    let executor = Arc::new(
        Executor::new(ExecutorConfig::builder().concurrency(5).request_rate(10.0, Duration::from_secs(1)).num_workers(2).build()).unwrap(),
    );
    executor.start().await.unwrap();

    let facade = Facade::new(endpoint, executor.clone());
    let payload = serde_json::json!({"messages": [{"role": "user", "content": "hi"}]});
    let event = facade.invoke(payload, InvokeOptions::default()).await.unwrap();

    for _ in 0..100 {
        if event.status().is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(event.status(), RequestStatus::Completed);
    let descriptor = event.descriptor();
    assert_eq!(descriptor.endpoint_url.as_deref(), Some("sdk://stub-llm/chat.completions.create"));
    assert_eq!(descriptor.method.as_deref(), Some("SDK_CALL"));
    let (_, _, body) = event.response().unwrap();
    assert_eq!(body.unwrap()["result"], "success");
    assert!(saw_expected_kwargs.load(Ordering::SeqCst), "default_request_kwargs should merge with the payload's own fields");

    executor.stop(true).await;
}
