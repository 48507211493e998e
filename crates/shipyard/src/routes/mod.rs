//! HTTP routes served next to the subscription gateway
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /health` | liveness |
//! | `GET /metrics` | ingest, fan-out, store and gateway counters |
//! | `GET /logs/{deployment_id}` | stored transcript of a deployment |

pub mod logs;
pub mod ops;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;

use shipyard_pipeline::{FanoutMetrics, IngestMetrics};
use shipyard_sinks::{LogSink, TranscriptReader};
use shipyard_tap::ChannelHub;

/// Counter sources exposed on `/metrics`
pub struct ServerMetrics {
    /// Server start time for uptime calculation
    pub start_time: Instant,
    pub ingest: Arc<IngestMetrics>,
    /// Absent when fan-out is disabled
    pub fanout: Option<Arc<FanoutMetrics>>,
    pub sink: Arc<dyn LogSink>,
    pub hub: Arc<ChannelHub>,
}

impl ServerMetrics {
    pub fn new(
        ingest: Arc<IngestMetrics>,
        fanout: Option<Arc<FanoutMetrics>>,
        sink: Arc<dyn LogSink>,
        hub: Arc<ChannelHub>,
    ) -> Self {
        Self {
            start_time: Instant::now(),
            ingest,
            fanout,
            sink,
            hub,
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Shared state of the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub transcripts: Arc<dyn TranscriptReader>,
    pub metrics: Arc<ServerMetrics>,
}

/// Build the HTTP router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(ops::routes())
        .merge(logs::routes())
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
