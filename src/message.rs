/// Inbound message envelope and the response returned to the source
///
/// Wraps the raw chat text with the identifiers used in logs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Source-message identifier, for logging only (uniqueness not enforced)
    pub message_id: String,

    /// Raw message text, exactly as received
    pub body: String,

    /// Timestamp when message was received
    pub received_at: DateTime<Utc>,

    /// Chat or channel the message came from
    pub source: Option<String>,
}

impl RawMessage {
    /// Create a new message with a generated identifier
    pub fn new(body: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), body)
    }

    /// Create a message tagged with the identifier assigned by the source platform
    pub fn with_id(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            body: body.into(),
            received_at: Utc::now(),
            source: None,
        }
    }

    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Response returned to the source after processing
#[derive(Debug, Serialize, Deserialize)]
pub struct RelayResponse {
    pub message_id: String,
    pub status: RelayStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayStatus {
    Dropped,    // Not a signal
    Forwarded,  // Accepted by the sink
    Failed,     // Sink rejected or unreachable
}
