//! Extraction runtime: the field rule table and the engine that applies it.
//!
//! Both are pure and synchronous; a compiled extractor holds no per-message
//! state and can be shared freely between concurrent handlers.

pub mod config_loader;
pub mod message_parser;

// Re-export key types
pub use config_loader::{FieldRule, RuleError, RuleTable, ValueShape};
pub use message_parser::{Extraction, SignalExtractor};
