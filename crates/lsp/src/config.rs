use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CONNECTION_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2000;

/// Connection and request settings for one [`LspSession`](crate::LspSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    /// Named backend behind a multiplexing proxy, sent as `?name=`.
    pub server_name: Option<String>,
    pub root_uri: Option<String>,
    /// Reconnect attempts after the first failure.
    pub connection_retries: u32,
    pub retry_backoff_ms: u64,
    /// No limit when unset.
    pub request_timeout_ms: Option<u64>,
    pub shutdown_timeout_ms: u64,
    pub log_server_messages: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            server_name: None,
            root_uri: None,
            connection_retries: DEFAULT_CONNECTION_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            request_timeout_ms: None,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            log_server_messages: true,
        }
    }
}

impl SessionConfig {
    pub fn new(root_uri: impl Into<String>) -> Self {
        Self {
            root_uri: Some(root_uri.into()),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.server_name = (!name.is_empty()).then_some(name);
        self
    }

    pub fn with_connection_retries(mut self, retries: u32) -> Self {
        self.connection_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff_ms = backoff.as_millis() as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_server_messages(mut self, enabled: bool) -> Self {
        self.log_server_messages = enabled;
        self
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Websocket address of the backend, e.g. `ws://localhost:5000/?name=tsserver`.
    pub fn address(&self) -> Result<String, url::ParseError> {
        let mut url = Url::parse(&format!("ws://{}:{}", self.host, self.port))?;
        if let Some(name) = &self.server_name {
            url.query_pairs_mut().append_pair("name", name);
        }
        Ok(url.into())
    }
}
