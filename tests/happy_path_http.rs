//! End-to-end scenario: an HTTP endpoint dispatched through a real executor
//! against a mock server, asserting the full status timeline lands on
//! `Completed` with the parsed body.

use std::sync::Arc;
use std::time::Duration;

use netdispatch::{Endpoint, EndpointConfig, Executor, ExecutorConfig, Facade, HttpConfig, InvokeOptions, RequestStatus, TransportKind};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn happy_path_http_completes_with_the_expected_body_and_monotonic_timeline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": "success"})))
        .mount(&server)
        .await;

    let endpoint_config = EndpointConfig::builder("completions", TransportKind::Http)
        .base_url(server.uri())
        .http_config(HttpConfig::default())
        .build()
        .unwrap();
    let endpoint = Arc::new(Endpoint::new(endpoint_config));

    let executor = Arc::new(
        Executor::new(ExecutorConfig::builder().concurrency(5).request_rate(10.0, Duration::from_secs(1)).num_workers(2).build()).unwrap(),
    );
    executor.start().await.unwrap();

    let facade = Facade::new(endpoint, executor.clone());
    let event = facade
        .invoke(serde_json::json!({"prompt": "hi"}), InvokeOptions { http_path: Some("v1/completions".to_string()), ..Default::default() })
        .await
        .unwrap();

    for _ in 0..100 {
        if event.status().is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(event.status(), RequestStatus::Completed);
    let (code, _, body) = event.response().unwrap();
    assert_eq!(code, 200);
    assert_eq!(body.unwrap()["result"], "success");

    let log = event.logs();
    assert!(!log.is_empty(), "a completed call should have logged at least its status transitions");

    let created = event.created_at();
    let queued = event.queued_at().unwrap();
    let processing = event.processing_started_at().unwrap();
    let calling = event.call_started_at().unwrap();
    let completed = event.completed_at().unwrap();
    assert!(created <= queued && queued <= processing && processing <= calling && calling <= completed);

    executor.stop(true).await;
}
