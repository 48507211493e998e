//! Tests for the HTTP routes

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use shipyard_protocol::LogEvent;
use shipyard_sinks::memory::MemoryLogStore;
use shipyard_sinks::{SinkError, StoredLogEvent};

use super::*;

struct BrokenReader;

#[async_trait]
impl TranscriptReader for BrokenReader {
    async fn transcript(&self, _deployment_id: &str) -> shipyard_sinks::Result<Vec<StoredLogEvent>> {
        Err(SinkError::Unavailable("connection refused".into()))
    }
}

fn app_with(store: Arc<MemoryLogStore>, transcripts: Arc<dyn TranscriptReader>) -> Router {
    let metrics = ServerMetrics::new(
        Arc::new(IngestMetrics::new()),
        Some(Arc::new(FanoutMetrics::new())),
        store,
        Arc::new(ChannelHub::default()),
    );
    build_router(AppState {
        transcripts,
        metrics: Arc::new(metrics),
    })
}

fn app(store: Arc<MemoryLogStore>) -> Router {
    app_with(store.clone(), store)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json(app(Arc::new(MemoryLogStore::new())), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_include_every_component() {
    let store = Arc::new(MemoryLogStore::new());
    store.write(&LogEvent::new("d1", "line")).await.unwrap();

    let (status, body) = get_json(app(store), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sink"]["type"], "memory");
    assert_eq!(body["sink"]["events_written"], 1);
    assert_eq!(body["ingest"]["events_written"], 0);
    assert_eq!(body["fanout"]["published"], 0);
    assert_eq!(body["gateway"]["connections"], 0);
}

#[tokio::test]
async fn test_transcript_in_order() {
    let store = Arc::new(MemoryLogStore::new());
    store.write(&LogEvent::new("d1", "Build started")).await.unwrap();
    store.write(&LogEvent::new("d2", "other")).await.unwrap();
    store.write(&LogEvent::new("d1", "Done")).await.unwrap();

    let (status, body) = get_json(app(store), "/logs/d1").await;
    assert_eq!(status, StatusCode::OK);

    let rows = body["rawLogs"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["log"], "Build started");
    assert_eq!(rows[1]["log"], "Done");
    assert_eq!(rows[0]["deployment_id"], "d1");
    assert!(rows[0]["event_id"].is_string());
    assert!(rows[0]["timestamp"].as_i64() < rows[1]["timestamp"].as_i64());
}

#[tokio::test]
async fn test_unknown_deployment_is_empty() {
    let (status, body) = get_json(app(Arc::new(MemoryLogStore::new())), "/logs/nope").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "rawLogs": [] }));
}

#[tokio::test]
async fn test_store_failure_is_503() {
    let app = app_with(Arc::new(MemoryLogStore::new()), Arc::new(BrokenReader));
    let (status, body) = get_json(app, "/logs/d1").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "STORE_UNAVAILABLE");
}
