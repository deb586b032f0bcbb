/// Sink that hands one payload to several registered sinks
///
/// Each sink gets exactly one attempt; the payload counts as delivered only
/// when every sink accepted it. A failure after a partial delivery names the
/// sinks that already have the payload.

use crate::relay::decision::Payload;
use crate::sink::{DeliveryError, DeliveryFuture, Sink};

#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn Sink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Register a sink.
    ///
    /// # Example
    /// ```ignore
    /// fanout.register(Box::new(WebhookSink::new(client.clone(), url)));
    /// fanout.register(Box::new(DiscordSink::new(client, token, channel)));
    /// ```
    pub fn register(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Names of the registered sinks, in delivery order.
    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }
}

impl Sink for FanoutSink {
    fn name(&self) -> &str {
        "fanout"
    }

    fn deliver<'a>(&'a self, payload: &'a Payload) -> DeliveryFuture<'a> {
        Box::pin(async move {
            let mut delivered = Vec::new();
            let mut errors = Vec::new();

            for sink in &self.sinks {
                match sink.deliver(payload).await {
                    Ok(()) => delivered.push(sink.name().to_string()),
                    Err(err) => {
                        tracing::warn!("Delivery to {} sink failed: {}", sink.name(), err);
                        errors.push(err);
                    }
                }
            }

            if errors.is_empty() {
                return Ok(());
            }
            if !delivered.is_empty() {
                tracing::info!("Partial delivery, accepted by: {}", delivered.join(", "));
            }

            match (errors.len(), delivered.is_empty()) {
                (1, true) => Err(errors.remove(0)),
                _ => Err(DeliveryError::Fanout { delivered, errors }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        fail_with: Option<u16>,
    }

    impl Sink for CountingSink {
        fn name(&self) -> &str {
            self.name
        }

        fn deliver<'a>(&'a self, _payload: &'a Payload) -> DeliveryFuture<'a> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                match self.fail_with {
                    Some(status) => Err(DeliveryError::Rejected {
                        sink: self.name.to_string(),
                        status,
                        message: "nope".to_string(),
                    }),
                    None => Ok(()),
                }
            })
        }
    }

    fn counting(name: &'static str, fail_with: Option<u16>) -> (Box<dyn Sink>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let sink: Box<dyn Sink> = Box::new(CountingSink {
            name,
            calls: calls.clone(),
            fail_with,
        });
        (sink, calls)
    }

    fn payload() -> Payload {
        Payload::Raw("Address: abc".to_string())
    }

    #[tokio::test]
    async fn test_delivers_to_every_sink_once() {
        let (a, a_calls) = counting("a", None);
        let (b, b_calls) = counting("b", None);
        let mut fanout = FanoutSink::new();
        fanout.register(a);
        fanout.register(b);

        assert!(fanout.deliver(&payload()).await.is_ok());
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fanout.sink_names(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_single_failure_is_reported_as_is() {
        let (a, _) = counting("a", Some(500));
        let mut fanout = FanoutSink::new();
        fanout.register(a);

        let err = fanout.deliver(&payload()).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_partial_delivery_names_accepting_sinks() {
        let (a, _) = counting("a", Some(500));
        let (b, b_calls) = counting("b", None);
        let mut fanout = FanoutSink::new();
        fanout.register(a);
        fanout.register(b);

        match fanout.deliver(&payload()).await {
            Err(DeliveryError::Fanout { delivered, errors }) => {
                assert_eq!(delivered, vec!["b"]);
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].status(), Some(500));
            }
            other => panic!("expected partial delivery failure, got {:?}", other),
        }
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_multiple_failures_are_combined() {
        let (a, _) = counting("a", Some(500));
        let (b, _) = counting("b", Some(401));
        let mut fanout = FanoutSink::new();
        fanout.register(a);
        fanout.register(b);

        match fanout.deliver(&payload()).await {
            Err(DeliveryError::Fanout { delivered, errors }) => {
                assert!(delivered.is_empty());
                let statuses: Vec<_> = errors.iter().filter_map(DeliveryError::status).collect();
                assert_eq!(statuses, vec![500, 401]);
            }
            other => panic!("expected combined failure, got {:?}", other),
        }
    }
}
