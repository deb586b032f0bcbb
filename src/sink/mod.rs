//! Outbound sinks for forwarded signals.
//!
//! A sink accepts one payload and reports success or a [`DeliveryError`].
//! Sinks make a single attempt; retrying is left to whoever reads the
//! failure.

pub mod discord;
pub mod fanout;
pub mod webhook;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::relay::decision::Payload;

pub use discord::DiscordSink;
pub use fanout::FanoutSink;
pub use webhook::WebhookSink;

/// Future returned by [`Sink::deliver`].
pub type DeliveryFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>;

/// Error type for delivery attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The sink answered with a non-success status
    Rejected {
        sink: String,
        status: u16,
        message: String,
    },
    /// The sink could not be reached (DNS, connect, timeout, ...)
    Unreachable { sink: String, reason: String },
    /// The payload could not be encoded
    Encode(String),
    /// Several sinks failed, or some failed after others accepted the payload
    Fanout {
        /// Sinks that accepted the payload; do not resend to these
        delivered: Vec<String>,
        errors: Vec<DeliveryError>,
    },
}

impl DeliveryError {
    /// HTTP status of a rejection, if the sink answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Rejected { sink, status, message } => {
                write!(f, "{} sink rejected payload with status {}: {}", sink, status, message)
            }
            DeliveryError::Unreachable { sink, reason } => {
                write!(f, "{} sink unreachable: {}", sink, reason)
            }
            DeliveryError::Encode(msg) => write!(f, "Failed to encode payload: {}", msg),
            DeliveryError::Fanout { delivered, errors } => {
                let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                write!(f, "{} sinks failed: {}", errors.len(), joined.join("; "))?;
                if !delivered.is_empty() {
                    write!(f, " (delivered to: {})", delivered.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Destination for forwarded payloads.
///
/// Implementations are constructed by the service and injected into the
/// relay; `deliver` is called once per forwarded message.
pub trait Sink: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Hand one payload to the destination
    fn deliver<'a>(&'a self, payload: &'a Payload) -> DeliveryFuture<'a>;
}

/// HTTP client shared by the HTTP-based sinks.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("signal-relay/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Turn a sink's HTTP response into a delivery result.
pub(crate) async fn check_response(sink: &str, response: reqwest::Response) -> Result<(), DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let text = response.text().await.unwrap_or_default();
    let message = if text.trim().is_empty() {
        status.canonical_reason().unwrap_or("no reason given").to_string()
    } else {
        text
    };

    Err(DeliveryError::Rejected {
        sink: sink.to_string(),
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn unreachable(sink: &str, err: reqwest::Error) -> DeliveryError {
    DeliveryError::Unreachable {
        sink: sink.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display_and_status() {
        let err = DeliveryError::Rejected {
            sink: "webhook".to_string(),
            status: 503,
            message: "maintenance".to_string(),
        };

        assert_eq!(err.status(), Some(503));
        assert_eq!(
            err.to_string(),
            "webhook sink rejected payload with status 503: maintenance"
        );
    }

    #[test]
    fn test_fanout_display_lists_every_failure() {
        let err = DeliveryError::Fanout {
            delivered: Vec::new(),
            errors: vec![
                DeliveryError::Unreachable {
                    sink: "webhook".to_string(),
                    reason: "connection refused".to_string(),
                },
                DeliveryError::Encode("bad".to_string()),
            ],
        };

        assert_eq!(err.status(), None);
        let text = err.to_string();
        assert!(text.starts_with("2 sinks failed"));
        assert!(text.contains("connection refused"));
        assert!(!text.contains("delivered to"));
    }

    #[test]
    fn test_fanout_display_names_delivered_sinks() {
        let err = DeliveryError::Fanout {
            delivered: vec!["webhook".to_string()],
            errors: vec![DeliveryError::Rejected {
                sink: "discord".to_string(),
                status: 401,
                message: "Unauthorized".to_string(),
            }],
        };

        assert_eq!(
            err.to_string(),
            "1 sinks failed: discord sink rejected payload with status 401: Unauthorized (delivered to: webhook)"
        );
    }
}
