//! Operations routes
//!
//! Health check and counters for monitoring.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use shipyard_pipeline::{FanoutSnapshot, IngestSnapshot};
use shipyard_sinks::SinkMetricsSnapshot;
use shipyard_tap::HubStats;

use super::AppState;

// =============================================================================
// Response Types
// =============================================================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

/// Sink counters with the store type
#[derive(Debug, Serialize)]
pub struct SinkSnapshot {
    #[serde(rename = "type")]
    pub sink_type: String,
    #[serde(flatten)]
    pub metrics: SinkMetricsSnapshot,
}

/// Metrics response
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub uptime_secs: u64,
    pub ingest: IngestSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fanout: Option<FanoutSnapshot>,
    pub sink: SinkSnapshot,
    pub gateway: HubStats,
}

// =============================================================================
// Routes
// =============================================================================

/// Operations routes (health, metrics)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.metrics.uptime_secs(),
    })
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsResponse> {
    let metrics = &state.metrics;

    Json(MetricsResponse {
        uptime_secs: metrics.uptime_secs(),
        ingest: metrics.ingest.snapshot(),
        fanout: metrics.fanout.as_ref().map(|f| f.snapshot()),
        sink: SinkSnapshot {
            sink_type: metrics.sink.name().to_string(),
            metrics: metrics.sink.metrics_snapshot(),
        },
        gateway: metrics.hub.stats(),
    })
}
