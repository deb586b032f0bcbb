/// HTTP webhook sink
///
/// POSTs the payload body with its content type to a fixed URL

use crate::relay::decision::Payload;
use crate::sink::{check_response, unreachable, DeliveryError, DeliveryFuture, Sink};

#[derive(Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Sink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn deliver<'a>(&'a self, payload: &'a Payload) -> DeliveryFuture<'a> {
        Box::pin(async move {
            let body = payload
                .to_body()
                .map_err(|e| DeliveryError::Encode(e.to_string()))?;

            let response = self
                .client
                .post(&self.url)
                .header(reqwest::header::CONTENT_TYPE, payload.content_type().mime())
                .body(body)
                .send()
                .await
                .map_err(|e| unreachable(self.name(), e))?;

            check_response(self.name(), response).await?;

            tracing::debug!("Delivered payload to webhook {}", self.url);
            Ok(())
        })
    }
}
