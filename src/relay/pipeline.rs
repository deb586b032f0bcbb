//! The message handler: extract, decide, deliver.

use chrono::Utc;

use crate::message::{RawMessage, RelayStatus};
use crate::relay::decision::{decide, Decision, Payload, RelayMode};
use crate::runtime::{Extraction, SignalExtractor};
use crate::sink::{DeliveryError, Sink};

/// Result of processing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a signal; nothing was sent
    Dropped,
    /// The sink accepted the payload
    Forwarded(Payload),
    /// The sink rejected the payload or could not be reached
    ForwardFailed(DeliveryError),
}

impl Outcome {
    pub fn status(&self) -> RelayStatus {
        match self {
            Outcome::Dropped => RelayStatus::Dropped,
            Outcome::Forwarded(_) => RelayStatus::Forwarded,
            Outcome::ForwardFailed(_) => RelayStatus::Failed,
        }
    }
}

/// Relays signals from a source to a sink.
///
/// One `process` call per inbound message. Calls share nothing but the
/// immutable extractor, so they can run concurrently in any order.
pub struct Relay {
    extractor: SignalExtractor,
    mode: RelayMode,
    sink: Box<dyn Sink>,
}

impl Relay {
    pub fn new(extractor: SignalExtractor, mode: RelayMode, sink: Box<dyn Sink>) -> Self {
        Self { extractor, mode, sink }
    }

    pub fn mode(&self) -> RelayMode {
        self.mode
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    pub fn extract(&self, raw: &str) -> Extraction {
        self.extractor.extract(raw)
    }

    /// Extract and decide without delivering.
    pub fn evaluate(&self, raw: &str) -> Decision {
        decide(raw, &self.extractor.extract(raw), self.mode)
    }

    /// Process one inbound message.
    ///
    /// Never fails: delivery errors come back as [`Outcome::ForwardFailed`].
    pub async fn process(&self, message: &RawMessage) -> Outcome {
        let extraction = self.extractor.extract(&message.body);

        let source = message.source.as_deref().unwrap_or("unknown source");

        if let Some(record) = extraction.record() {
            if !record.is_complete() {
                tracing::debug!(
                    "Message {} from {} ({}) is a partial signal, missing: {}",
                    message.message_id,
                    source,
                    record.address(),
                    record.missing_fields().join(", ")
                );
            }
        }

        let payload = match decide(&message.body, &extraction, self.mode) {
            Decision::Drop => {
                tracing::debug!(
                    "Message {} from {} is not a signal, dropping",
                    message.message_id,
                    source
                );
                return Outcome::Dropped;
            }
            Decision::Forward(payload) => payload,
        };

        match self.sink.deliver(&payload).await {
            Ok(()) => {
                tracing::info!(
                    "Forwarded message {} from {} ({} mode) to {} sink in {} ms",
                    message.message_id,
                    source,
                    self.mode,
                    self.sink.name(),
                    (Utc::now() - message.received_at).num_milliseconds()
                );
                Outcome::Forwarded(payload)
            }
            Err(err) => {
                tracing::warn!(
                    "Failed to forward message {} from {}: {}",
                    message.message_id,
                    source,
                    err
                );
                Outcome::ForwardFailed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::DeliveryFuture;
    use std::sync::{Arc, Mutex};

    const REPORT: &str = include_str!("../../tests/fixtures/seer_report.txt");

    #[derive(Clone, Default)]
    struct RecordingSink {
        delivered: Arc<Mutex<Vec<Payload>>>,
    }

    impl Sink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn deliver<'a>(&'a self, payload: &'a Payload) -> DeliveryFuture<'a> {
            Box::pin(async move {
                self.delivered.lock().unwrap().push(payload.clone());
                Ok(())
            })
        }
    }

    struct RejectingSink;

    impl Sink for RejectingSink {
        fn name(&self) -> &str {
            "rejecting"
        }

        fn deliver<'a>(&'a self, _payload: &'a Payload) -> DeliveryFuture<'a> {
            Box::pin(async move {
                Err(DeliveryError::Rejected {
                    sink: "rejecting".to_string(),
                    status: 429,
                    message: "slow down".to_string(),
                })
            })
        }
    }

    fn relay(mode: RelayMode, sink: Box<dyn Sink>) -> Relay {
        Relay::new(SignalExtractor::with_builtin_rules().unwrap(), mode, sink)
    }

    #[tokio::test]
    async fn test_signal_is_forwarded_once() {
        let sink = RecordingSink::default();
        let relay = relay(RelayMode::Structured, Box::new(sink.clone()));

        let outcome = relay.process(&RawMessage::new(REPORT)).await;

        assert_eq!(outcome.status(), RelayStatus::Forwarded);
        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        match &delivered[0] {
            Payload::Record(record) => assert_eq!(record.name(), "hillury clinton"),
            other => panic!("expected a record payload, got {:?}", other),
        }
        assert_eq!(outcome, Outcome::Forwarded(delivered[0].clone()));
    }

    #[tokio::test]
    async fn test_raw_mode_forwards_text() {
        let sink = RecordingSink::default();
        let relay = relay(RelayMode::Raw, Box::new(sink.clone()));

        let outcome = relay.process(&RawMessage::new(REPORT)).await;

        assert_eq!(outcome, Outcome::Forwarded(Payload::Raw(REPORT.to_string())));
    }

    #[tokio::test]
    async fn test_sourced_messages_are_relayed_alike() {
        let sink = RecordingSink::default();
        let relay = relay(RelayMode::Raw, Box::new(sink.clone()));

        let sourced = RawMessage::with_id("tg-9", REPORT).from_source("Dither AI");
        let chatter = RawMessage::new("gm").from_source("Dither AI");

        assert_eq!(relay.process(&sourced).await.status(), RelayStatus::Forwarded);
        assert_eq!(relay.process(&chatter).await, Outcome::Dropped);
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_chatter_is_dropped_without_delivery() {
        let sink = RecordingSink::default();
        let relay = relay(RelayMode::Raw, Box::new(sink.clone()));

        let outcome = relay.process(&RawMessage::new("gm, anyone aping tonight?")).await;

        assert_eq!(outcome, Outcome::Dropped);
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_is_an_outcome() {
        let relay = relay(RelayMode::Structured, Box::new(RejectingSink));

        let outcome = relay.process(&RawMessage::new(REPORT)).await;

        match outcome {
            Outcome::ForwardFailed(err) => {
                assert_eq!(err.status(), Some(429));
                assert!(err.to_string().contains("slow down"));
            }
            other => panic!("expected ForwardFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_messages_are_independent() {
        let sink = RecordingSink::default();
        let relay = Arc::new(relay(RelayMode::Structured, Box::new(sink.clone())));

        let mut handles = Vec::new();
        for i in 0..16 {
            let relay = relay.clone();
            let body = if i % 2 == 0 {
                format!("Address: token{}\nTransactions: {}", i, i)
            } else {
                format!("just chatting {}", i)
            };
            handles.push(tokio::spawn(async move {
                relay.process(&RawMessage::new(body)).await
            }));
        }

        let mut forwarded = 0;
        for handle in handles {
            if handle.await.unwrap().status() == RelayStatus::Forwarded {
                forwarded += 1;
            }
        }

        assert_eq!(forwarded, 8);
        let mut addresses: Vec<String> = sink
            .delivered
            .lock()
            .unwrap()
            .iter()
            .filter_map(|p| match p {
                Payload::Record(r) => Some(r.address().to_string()),
                Payload::Raw(_) => None,
            })
            .collect();
        addresses.sort();
        assert_eq!(addresses.len(), 8);
        assert!(addresses.contains(&"token14".to_string()));
    }

    #[test]
    fn test_evaluate_is_pure() {
        let relay = relay(RelayMode::Raw, Box::new(RejectingSink));

        assert_eq!(relay.evaluate("no signal here"), Decision::Drop);
        assert_eq!(relay.evaluate(REPORT), relay.evaluate(REPORT));
        assert_eq!(relay.sink_name(), "rejecting");
        assert!(relay.extract(REPORT).is_valid());
    }
}
