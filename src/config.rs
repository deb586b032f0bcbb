//! Service configuration read from the environment.
//!
//! Call `dotenv::dotenv()` before [`RelayConfig::from_env`] to pick up a
//! local `.env` file. Recognised variables:
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `HOST` | `0.0.0.0` | listen address |
//! | `PORT` | `8000` | listen port |
//! | `RELAY_MODE` | `structured` | `raw` or `structured` payloads |
//! | `SIGNAL_RULES` | built-in table | YAML rule file |
//! | `RELAY_WEBHOOK_URL` | none | webhook sink |
//! | `DISCORD_BOT_TOKEN` / `DISCORD_CHANNEL_ID` | none | Discord channel sink |
//! | `DISCORD_API_BASE` | `https://discord.com/api/v10` | Discord API root |
//! | `SINK_TIMEOUT_SECS` | `10` | per-request timeout of HTTP sinks |

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use crate::relay::{Relay, RelayMode};
use crate::runtime::{RuleError, RuleTable, SignalExtractor};
use crate::sink::{build_http_client, discord, DiscordSink, FanoutSink, WebhookSink};

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    Incomplete(String),
    NoSinks,
    Rules(RuleError),
    HttpClient(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value, reason } => {
                write!(f, "Invalid value '{}' for {}: {}", value, key, reason)
            }
            ConfigError::Incomplete(msg) => write!(f, "Incomplete configuration: {}", msg),
            ConfigError::NoSinks => write!(
                f,
                "No sink configured (set RELAY_WEBHOOK_URL and/or DISCORD_BOT_TOKEN + DISCORD_CHANNEL_ID)"
            ),
            ConfigError::Rules(err) => write!(f, "{}", err),
            ConfigError::HttpClient(msg) => write!(f, "Failed to build HTTP client: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<RuleError> for ConfigError {
    fn from(err: RuleError) -> Self {
        ConfigError::Rules(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordConfig {
    pub token: String,
    pub channel_id: String,
    pub api_base: String,
}

/// Values given on the command line. Each one that is set replaces the
/// environment value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub mode: Option<RelayMode>,
    pub rules_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub mode: RelayMode,
    pub rules_path: Option<PathBuf>,
    pub webhook_url: Option<String>,
    pub discord: Option<DiscordConfig>,
    pub sink_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            mode: RelayMode::default(),
            rules_path: None,
            webhook_url: None,
            discord: None,
            sink_timeout: Duration::from_secs(10),
        }
    }
}

fn invalid(key: &str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl RelayConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }

        if let Some(port) = get("PORT") {
            config.port = port.parse::<u16>().map_err(|e| invalid("PORT", &port, e))?;
        }

        if let Some(mode) = get("RELAY_MODE") {
            config.mode = mode.parse::<RelayMode>().map_err(|e| invalid("RELAY_MODE", &mode, e))?;
        }

        config.rules_path = get("SIGNAL_RULES").map(PathBuf::from);
        config.webhook_url = get("RELAY_WEBHOOK_URL");

        if let Some(secs) = get("SINK_TIMEOUT_SECS") {
            let parsed: u64 = secs.parse().map_err(|e| invalid("SINK_TIMEOUT_SECS", &secs, e))?;
            if parsed == 0 {
                return Err(invalid("SINK_TIMEOUT_SECS", &secs, "must be at least 1"));
            }
            config.sink_timeout = Duration::from_secs(parsed);
        }

        config.discord = match (get("DISCORD_BOT_TOKEN"), get("DISCORD_CHANNEL_ID")) {
            (Some(token), Some(channel_id)) => {
                channel_id
                    .parse::<u64>()
                    .map_err(|e| invalid("DISCORD_CHANNEL_ID", &channel_id, e))?;
                Some(DiscordConfig {
                    token,
                    channel_id,
                    api_base: get("DISCORD_API_BASE")
                        .unwrap_or_else(|| discord::DEFAULT_API_BASE.to_string()),
                })
            }
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Incomplete(
                    "DISCORD_BOT_TOKEN is set but DISCORD_CHANNEL_ID is not".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete(
                    "DISCORD_CHANNEL_ID is set but DISCORD_BOT_TOKEN is not".to_string(),
                ))
            }
        };

        Ok(config)
    }

    /// Read the environment, then apply command-line overrides
    pub fn from_env_with(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Ok(Self::from_env()?.with_overrides(overrides))
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if overrides.rules_path.is_some() {
            self.rules_path = overrides.rules_path;
        }
        self
    }

    /// Resolve `host` (IP literal or hostname) and `port` to a listen address
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| invalid("HOST", &self.host, e))?
            .next()
            .ok_or_else(|| invalid("HOST", &self.host, "resolved to no address"))
    }

    /// Rule file if configured, otherwise the built-in table
    pub fn load_rules(&self) -> Result<RuleTable, ConfigError> {
        match &self.rules_path {
            Some(path) => Ok(RuleTable::load_from_file(path)?),
            None => Ok(RuleTable::builtin()),
        }
    }

    pub fn build_extractor(&self) -> Result<SignalExtractor, ConfigError> {
        Ok(SignalExtractor::new(&self.load_rules()?)?)
    }

    /// Every configured sink behind one fanout
    pub fn build_sink(&self) -> Result<FanoutSink, ConfigError> {
        let client = build_http_client(self.sink_timeout)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let mut sinks = FanoutSink::new();

        if let Some(url) = &self.webhook_url {
            let sink = WebhookSink::new(client.clone(), url.clone());
            tracing::info!("Webhook sink -> {}", sink.url());
            sinks.register(Box::new(sink));
        }

        if let Some(discord) = &self.discord {
            let sink = DiscordSink::new(client, discord.token.clone(), discord.channel_id.clone())
                .with_api_base(discord.api_base.clone());
            tracing::info!("Discord sink -> channel {}", sink.channel_id());
            sinks.register(Box::new(sink));
        }

        if sinks.is_empty() {
            return Err(ConfigError::NoSinks);
        }

        Ok(sinks)
    }

    pub fn build_relay(&self) -> Result<Relay, ConfigError> {
        let extractor = self.build_extractor()?;
        let sink = self.build_sink()?;
        Ok(Relay::new(extractor, self.mode, Box::new(sink)))
    }
}
