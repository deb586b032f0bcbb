//! Relay decision and the per-message pipeline around it.

pub mod decision;
pub mod pipeline;

pub use decision::{decide, ContentType, Decision, Payload, RelayMode};
pub use pipeline::{Outcome, Relay};
