/// Discord channel sink
///
/// Sends each payload as one channel message through the Discord REST API
/// using a bot token

use serde_json::json;

use crate::relay::decision::Payload;
use crate::sink::{check_response, unreachable, DeliveryError, DeliveryFuture, Sink};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Clone)]
pub struct DiscordSink {
    client: reqwest::Client,
    api_base: String,
    token: String,
    channel_id: String,
}

impl DiscordSink {
    pub fn new(client: reqwest::Client, token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            channel_id: channel_id.into(),
        }
    }

    /// Point the sink at another API root (self-hosted proxy, test stub)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/channels/{}/messages",
            self.api_base.trim_end_matches('/'),
            self.channel_id
        )
    }
}

/// Message text for a payload. Records are posted as a JSON code block.
pub fn render_content(payload: &Payload) -> Result<String, DeliveryError> {
    match payload {
        Payload::Raw(text) => Ok(text.clone()),
        Payload::Record(record) => {
            let pretty = serde_json::to_string_pretty(record)
                .map_err(|e| DeliveryError::Encode(e.to_string()))?;
            Ok(format!("```json\n{}\n```", pretty))
        }
    }
}

impl Sink for DiscordSink {
    fn name(&self) -> &str {
        "discord"
    }

    fn deliver<'a>(&'a self, payload: &'a Payload) -> DeliveryFuture<'a> {
        Box::pin(async move {
            let content = render_content(payload)?;

            let response = self
                .client
                .post(self.messages_url())
                .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
                .json(&json!({ "content": content }))
                .send()
                .await
                .map_err(|e| unreachable(self.name(), e))?;

            check_response(self.name(), response).await?;

            tracing::debug!("Posted payload to Discord channel {}", self.channel_id);
            Ok(())
        })
    }
}
