//! Client configuration with validation.
//!
//! Every section has defaults, so an empty TOML file or
//! `ClientConfig::default()` talks to a compose server on `localhost:8000`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::error::{ClientError, ClientResult};

/// Schema the server ships with by default.
pub const DEFAULT_SCHEMA_NAME: &str = "ABRSchema_0-2-0.json";

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server endpoints and HTTP timeouts
    pub server: ServerConfig,
    /// Where the state schema comes from
    pub schema: SchemaConfig,
    /// Push channel behaviour
    pub notifier: NotifierConfig,
    /// Preview thumbnail polling
    pub thumbnail: ThumbnailConfig,
    /// How overlapping refreshes are resolved
    pub refresh: RefreshConfig,
    /// Local event bus
    pub bus: BusConfig,
}

impl ClientConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> ClientResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Apply `ABR_SERVER_URL`, `ABR_WS_URL` and `ABR_SCHEMA_URL` overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("ABR_SERVER_URL") {
            self.server.base_url = url;
        }
        if let Ok(url) = std::env::var("ABR_WS_URL") {
            self.server.ws_url = Some(url);
        }
        if let Ok(url) = std::env::var("ABR_SCHEMA_URL") {
            self.schema.url = Some(url);
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ClientResult<()> {
        let base = reqwest::Url::parse(&self.server.base_url)
            .map_err(|e| ClientError::Config(format!("server.base_url: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Config(
                "server.base_url must be an http(s) URL".into(),
            ));
        }

        let ws = self.ws_url()?;
        if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
            return Err(ClientError::Config(format!(
                "server.ws_url must use ws:// or wss://, got {ws}"
            )));
        }

        if self.server.request_timeout.is_zero() {
            return Err(ClientError::Config(
                "server.request_timeout cannot be 0".into(),
            ));
        }

        let reconnect = &self.notifier.reconnect;
        if reconnect.base_delay > reconnect.max_delay {
            return Err(ClientError::Config(
                "notifier.reconnect.base_delay exceeds max_delay".into(),
            ));
        }

        if self.thumbnail.max_attempts > 0 && self.thumbnail.poll_interval.is_zero() {
            return Err(ClientError::Config(
                "thumbnail.poll_interval cannot be 0 while polling is enabled".into(),
            ));
        }

        if self.bus.capacity == 0 {
            return Err(ClientError::Config("bus.capacity cannot be 0".into()));
        }

        Ok(())
    }

    /// Push channel URL: explicit, or `ws(s)://<host>/ws/` derived from the base URL.
    pub fn ws_url(&self) -> ClientResult<String> {
        if let Some(url) = &self.server.ws_url {
            return Ok(url.clone());
        }
        let mut url = reqwest::Url::parse(&self.server.base_url)
            .map_err(|e| ClientError::Config(format!("server.base_url: {e}")))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::Config(format!("cannot derive ws url from {url}")))?;
        url.set_path("/ws/");
        url.set_query(None);
        Ok(url.to_string())
    }

    /// Absolute schema URL: explicit, or the server's bundled schema.
    pub fn schema_url(&self) -> String {
        match &self.schema.url {
            Some(url) => url.clone(),
            None => format!(
                "{}/api/schemas/{}/",
                self.server.base_url.trim_end_matches('/'),
                self.schema.name
            ),
        }
    }
}

/// Server endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP base URL of the compose server
    pub base_url: String,
    /// Push channel URL (derived from `base_url` when unset)
    pub ws_url: Option<String>,
    /// Whole-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// TCP connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            ws_url: None,
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

/// Schema source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Absolute URL; overrides `name`
    pub url: Option<String>,
    /// Schema file served by the compose server under `/api/schemas/`
    pub name: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            url: None,
            name: DEFAULT_SCHEMA_NAME.to_string(),
        }
    }
}

/// Push channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Payload sent once the socket opens
    pub handshake: String,
    /// How long `Session::connect` waits for the channel to become ready
    #[serde(with = "humantime_serde")]
    pub ready_timeout: Duration,
    /// Retry behaviour after the channel drops
    pub reconnect: ReconnectPolicy,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            handshake: "Hello from ABR Compose".to_string(),
            ready_timeout: Duration::from_secs(5),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Exponential backoff for the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Consecutive failed attempts before giving up; 0 disables reconnects
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Upper bound on a single delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl ReconnectPolicy {
    /// No retries: a dropped channel goes straight to `Closed`.
    pub fn never() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        std::cmp::min(self.base_delay.saturating_mul(factor), self.max_delay)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }
}

/// Thumbnail polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Server path of the most recent render
    pub path: String,
    /// Delay between polls
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Poll ceiling per refresh; 0 disables polling
    pub max_attempts: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            path: "/media/thumbnails/latest-thumbnail.png".to_string(),
            poll_interval: Duration::from_millis(500),
            max_attempts: 10,
        }
    }
}

/// Resolution of overlapping `refresh_state` calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOrdering {
    /// The response that completes last is applied, whatever its age.
    #[default]
    LastWriteWins,
    /// Responses older than the last applied one are discarded.
    Sequenced,
}

/// Refresh configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub ordering: RefreshOrdering,
}

/// Event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Events buffered per subscriber before the oldest are dropped
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: abr_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
