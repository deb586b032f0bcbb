//! Serialization of extracted records.
//!
//! Records travel as JSON objects of objects: `address` and `name` at the top
//! level, then one object per metric group. The CLI also writes batches of
//! results as NDJSON.

use serde::Serialize;
use std::io::Write;

use crate::record::ExtractedRecord;

/// Error type for serialization operations
#[derive(Debug)]
pub enum SerializationError {
    JsonError(serde_json::Error),
    IoError(std::io::Error),
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::JsonError(err)
    }
}

impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::IoError(err)
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::JsonError(e) => write!(f, "JSON error: {}", e),
            SerializationError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SerializationError {}

/// Encode a record as compact JSON.
pub fn encode_record(record: &ExtractedRecord) -> Result<String, SerializationError> {
    Ok(serde_json::to_string(record)?)
}

/// Parse a record previously produced by [`encode_record`].
pub fn decode_record(json: &str) -> Result<ExtractedRecord, SerializationError> {
    Ok(serde_json::from_str(json)?)
}

/// NDJSON (Newline Delimited JSON) writer
///
/// Writes values as NDJSON, one JSON object per line.
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    /// Create a new NDJSON writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single value as an NDJSON line
    pub fn write<T: Serialize>(&mut self, value: &T) -> Result<(), SerializationError> {
        let json = serde_json::to_string(value)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}
