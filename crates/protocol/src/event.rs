//! Log event wire format
//!
//! Build jobs publish one JSON object per log line:
//!
//! ```json
//! {"PROJECT_ID": "p1", "DEPLOYMENT_ID": "d1", "log": "Build started"}
//! ```
//!
//! `DEPLOYMENT_ID` and `log` are required. `log` may be an empty string;
//! `PROJECT_ID` is informational only (routing uses the metadata store).

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::ProtocolError;

/// Wire field holding the deployment identifier
pub const FIELD_DEPLOYMENT_ID: &str = "DEPLOYMENT_ID";

/// Wire field holding the raw log line
pub const FIELD_LOG: &str = "log";

/// A single log line emitted by a build job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Project the job was started for, as claimed by the producer
    pub project_id: Option<String>,
    /// Deployment the line belongs to
    pub deployment_id: String,
    /// Raw log text, passed through untouched
    pub log_line: String,
}

#[derive(Deserialize)]
struct WireEventIn {
    #[serde(rename = "PROJECT_ID", default)]
    project_id: Option<String>,
    #[serde(rename = "DEPLOYMENT_ID", default)]
    deployment_id: Option<String>,
    #[serde(default)]
    log: Option<String>,
}

#[derive(Serialize)]
struct WireEventOut<'a> {
    #[serde(rename = "PROJECT_ID", skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
    #[serde(rename = "DEPLOYMENT_ID")]
    deployment_id: &'a str,
    log: &'a str,
}

impl LogEvent {
    /// Create an event without a project id
    pub fn new(deployment_id: impl Into<String>, log_line: impl Into<String>) -> Self {
        Self {
            project_id: None,
            deployment_id: deployment_id.into(),
            log_line: log_line.into(),
        }
    }

    /// Attach the producer-supplied project id
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Decode a transport payload
    ///
    /// `None` is a tombstone and is rejected like any other malformed message.
    pub fn from_payload(payload: Option<&[u8]>) -> Result<Self> {
        match payload {
            Some(bytes) => Self::decode(bytes),
            None => Err(ProtocolError::NullPayload),
        }
    }

    /// Decode a JSON payload
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let wire: WireEventIn = serde_json::from_slice(bytes)?;

        let deployment_id = wire
            .deployment_id
            .ok_or(ProtocolError::missing_field(FIELD_DEPLOYMENT_ID))?;
        if deployment_id.trim().is_empty() {
            return Err(ProtocolError::EmptyField(FIELD_DEPLOYMENT_ID));
        }

        let log_line = wire
            .log
            .ok_or(ProtocolError::missing_field(FIELD_LOG))?;

        Ok(Self {
            project_id: wire.project_id.filter(|p| !p.is_empty()),
            deployment_id,
            log_line,
        })
    }

    /// Encode to the wire format
    pub fn to_payload(&self) -> Bytes {
        let wire = WireEventOut {
            project_id: self.project_id.as_deref(),
            deployment_id: &self.deployment_id,
            log: &self.log_line,
        };
        // Serializing a struct of strings cannot fail
        Bytes::from(serde_json::to_vec(&wire).unwrap_or_default())
    }
}
