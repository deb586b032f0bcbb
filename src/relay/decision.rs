//! Forward/drop decision and outbound payload selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::record::ExtractedRecord;
use crate::runtime::Extraction;
use crate::serialization::{encode_record, SerializationError};

/// What a forwarded signal looks like on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// The original message text, unmodified
    Raw,
    /// The extracted record as JSON
    #[default]
    Structured,
}

impl FromStr for RelayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(RelayMode::Raw),
            "structured" | "record" | "json" => Ok(RelayMode::Structured),
            other => Err(format!(
                "Unknown relay mode '{}' (expected 'raw' or 'structured')",
                other
            )),
        }
    }
}

impl fmt::Display for RelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayMode::Raw => write!(f, "raw"),
            RelayMode::Structured => write!(f, "structured"),
        }
    }
}

/// Content-type hint handed to sinks with each payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    PlainText,
    Json,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::PlainText => "text/plain; charset=utf-8",
            ContentType::Json => "application/json",
        }
    }
}

/// Outbound payload of a forwarded signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Raw(String),
    Record(ExtractedRecord),
}

impl Payload {
    pub fn content_type(&self) -> ContentType {
        match self {
            Payload::Raw(_) => ContentType::PlainText,
            Payload::Record(_) => ContentType::Json,
        }
    }

    /// Text body as sent to a sink.
    pub fn to_body(&self) -> Result<String, SerializationError> {
        match self {
            Payload::Raw(text) => Ok(text.clone()),
            Payload::Record(record) => encode_record(record),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Forward(Payload),
    Drop,
}

/// Gate a message on extraction validity and pick its payload.
///
/// Never touches the record's fields: a valid record is forwarded as is, or
/// the original text is forwarded in its place.
pub fn decide(raw: &str, extraction: &Extraction, mode: RelayMode) -> Decision {
    match (extraction, mode) {
        (Extraction::Invalid, _) => Decision::Drop,
        (Extraction::Valid(_), RelayMode::Raw) => Decision::Forward(Payload::Raw(raw.to_string())),
        (Extraction::Valid(record), RelayMode::Structured) => {
            Decision::Forward(Payload::Record(record.clone()))
        }
    }
}
