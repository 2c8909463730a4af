//! HTTP surface integration tests.
//!
//! Starts the axum router on an ephemeral port and exercises it with
//! reqwest against the in-memory transport.

mod common;

use std::sync::Arc;

use common::{sample_payload, test_kafka_config};
use kafka_intake::{server, ProducerCell, TransportMode};
use serde_json::{json, Value};

/// Bind to port 0 and return the actual address.
async fn start_server(cell: Arc<ProducerCell>) -> String {
    let app = server::router(cell);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn initialized_cell() -> Arc<ProducerCell> {
    let cell = Arc::new(ProducerCell::new());
    cell.get_or_init(&test_kafka_config(), TransportMode::Mock)
        .unwrap();
    cell
}

#[tokio::test]
async fn health_check() {
    let base = start_server(initialized_cell()).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn produce_a_batch_of_valid_payloads() {
    let base = start_server(initialized_cell()).await;
    let client = reqwest::Client::new();

    let payloads = vec![
        sample_payload(json!({"n": 1})),
        sample_payload(json!({"n": 2})),
    ];
    let resp = client
        .post(format!("{base}/v1/produce/events"))
        .json(&payloads)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], 200);
    let responses = body["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["partition"], 0);
    assert_eq!(responses[0]["offset"], 0);
    assert_eq!(responses[0]["errors"], json!([]));
    assert_eq!(responses[1]["offset"], 1);
}

#[tokio::test]
async fn produce_downgrades_to_bad_request_on_any_failure() {
    let base = start_server(initialized_cell()).await;
    let client = reqwest::Client::new();

    let payloads = json!([null, sample_payload(json!({"n": 1}))]);
    let resp = client
        .post(format!("{base}/v1/produce/events"))
        .json(&payloads)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], 400);
    let responses = body["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["errors"], json!(["Payload cannot be null"]));
    assert_eq!(responses[0]["partition"], Value::Null);
    assert_eq!(responses[1]["errors"], json!([]));
}

#[tokio::test]
async fn produce_reports_per_payload_validation_messages() {
    let base = start_server(initialized_cell()).await;
    let client = reqwest::Client::new();

    let payloads = json!([
        {"ipAddress": "10.0.0.1", "data": {"n": 1}},
        {"client": "TEST", "data": {"n": 2}}
    ]);
    let resp = client
        .post(format!("{base}/v1/produce/events"))
        .json(&payloads)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    let responses = body["responses"].as_array().unwrap();
    assert_eq!(responses[0]["errors"], json!(["Client value cannot be null or empty"]));
    assert_eq!(responses[1]["errors"], json!(["Provide a valid IP Address"]));
}

#[tokio::test]
async fn metrics_endpoint_serves_the_transport_snapshot() {
    let cell = initialized_cell();
    let base = start_server(Arc::clone(&cell)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/v1/produce/metrics"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["transport"], "mock");
}

#[tokio::test]
async fn metrics_fail_when_no_producer_was_initialized() {
    let base = start_server(Arc::new(ProducerCell::new())).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/v1/produce/metrics"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not initialized"));
}

#[tokio::test]
async fn produce_fails_when_no_producer_was_initialized() {
    let base = start_server(Arc::new(ProducerCell::new())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/v1/produce/events"))
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
}

#[tokio::test]
async fn produce_after_close_reports_every_slot_uninitialized() {
    let cell = initialized_cell();
    cell.get().unwrap().close();
    let base = start_server(cell).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/v1/produce/events"))
        .json(&json!([sample_payload(json!({"n": 1}))]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    let responses = body["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 1);
    assert!(responses[0]["errors"][0]
        .as_str()
        .unwrap()
        .contains("not initialized"));
}
