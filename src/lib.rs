//! # signal-relay: chat signal extraction and relay
//!
//! Relays analytics reports ("signals") posted in a group chat to downstream
//! sinks, dropping everything that is not a report on the way.
//!
//! ## Features
//!
//! - **Table-driven extraction**: an ordered table of field rules turns a
//!   decorated free-text report into an [`ExtractedRecord`]; fields that are
//!   missing fall back to the `"Not found"` sentinel
//! - **Implicit classification**: a message without an address is not a
//!   signal and yields no record at all
//! - **Relay modes**: forward the original text or the record as JSON
//! - **Sinks**: HTTP webhook and Discord channel, one attempt each
//! - **Ingestion server**: axum endpoint the chat listener POSTs messages to
//!
//! ## Example
//!
//! ```
//! use signal_relay::runtime::SignalExtractor;
//!
//! let extractor = SignalExtractor::with_builtin_rules().unwrap();
//! let record = extractor
//!     .extract("Address: 6X7XXRb2bfoEogRXHBEDxPeyKVMPSNaQd8uCTU3biTqQ\nName: hillury clinton (CLINTON)")
//!     .into_record()
//!     .unwrap();
//!
//! assert_eq!(record.name(), "hillury clinton");
//! assert_eq!(record.financials().get("price").map(String::as_str), Some("Not found"));
//! ```

// Core modules
pub mod extraction;
pub mod record;
pub mod serialization;

// Rule table and extraction engine
pub mod runtime;

// Decision, pipeline and outbound sinks
pub mod relay;
pub mod sink;

// Service plumbing
pub mod config;
pub mod message;
pub mod server;

// Re-export key types
pub use extraction::{FieldGroup, FieldPath, FieldPathError};
pub use record::{ExtractedRecord, NOT_FOUND};
pub use serialization::{decode_record, encode_record, NdjsonWriter, SerializationError};

pub use runtime::{Extraction, FieldRule, RuleError, RuleTable, SignalExtractor, ValueShape};

pub use relay::{decide, ContentType, Decision, Outcome, Payload, Relay, RelayMode};
pub use sink::{DeliveryError, DiscordSink, FanoutSink, Sink, WebhookSink};

pub use config::{ConfigError, ConfigOverrides, DiscordConfig, RelayConfig};
pub use message::{RawMessage, RelayResponse, RelayStatus};
