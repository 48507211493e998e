//! Transcript route

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use tracing::warn;

use shipyard_sinks::StoredLogEvent;

use super::AppState;

/// Transcript response
#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    #[serde(rename = "rawLogs")]
    pub raw_logs: Vec<StoredLogEvent>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/logs/{deployment_id}", get(transcript_handler))
}

/// GET /logs/{deployment_id}
///
/// Every stored event of the deployment, oldest first. Unknown deployments
/// return an empty list.
async fn transcript_handler(
    State(state): State<AppState>,
    Path(deployment_id): Path<String>,
) -> Result<Json<TranscriptResponse>, (StatusCode, Json<serde_json::Value>)> {
    match state.transcripts.transcript(&deployment_id).await {
        Ok(raw_logs) => Ok(Json(TranscriptResponse { raw_logs })),
        Err(e) => {
            warn!(deployment_id, error = %e, "transcript query failed");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "error": "STORE_UNAVAILABLE",
                    "message": e.to_string(),
                })),
            ))
        }
    }
}
