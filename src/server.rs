//! HTTP surface mapping produce requests onto the publish client.
//!
//! ## Routes
//!
//! - `POST /v1/produce/:topic`: publish a JSON array of payloads to
//!   `topic`. The response body is the aggregated
//!   [`ResponseList`](crate::response::ResponseList) and the HTTP
//!   status mirrors its `status` field.
//! - `GET /v1/produce/metrics`: latest transport metrics as JSON;
//!   `500` when the producer is not initialized.
//! - `GET /health`: liveness check returning `{ "ok": true }`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use crate::broker::ProducerCell;
use crate::error::{Error, Result};
use crate::payload::Payload;

/// Build an axum `Router` publishing through the given producer cell.
pub fn router(cell: Arc<ProducerCell>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/produce/metrics", get(metrics_handler))
        .route("/v1/produce/:topic", post(produce_handler))
        .with_state(cell)
}

/// Serve the publish client over HTTP until shutdown is requested.
pub async fn serve(cell: Arc<ProducerCell>, addr: &str) -> Result<()> {
    let app = router(cell);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP listener bound");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn produce_handler(
    State(cell): State<Arc<ProducerCell>>,
    Path(topic): Path<String>,
    Json(payloads): Json<Vec<Option<Payload>>>,
) -> impl IntoResponse {
    let Some(producer) = cell.get() else {
        return not_initialized();
    };
    let list = producer.publish_batch(&topic, payloads).await;
    let status = StatusCode::from_u16(list.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(list)).into_response()
}

async fn metrics_handler(State(cell): State<Arc<ProducerCell>>) -> impl IntoResponse {
    let Some(producer) = cell.get() else {
        return not_initialized();
    };
    match producer.metrics() {
        Ok(snapshot) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            snapshot,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

fn not_initialized() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": Error::NotInitialized.to_string() })),
    )
        .into_response()
}
