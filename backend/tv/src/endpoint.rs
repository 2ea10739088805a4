//! Where the TV is and how to address its art channel.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use theframe_logging::redact_sensitive_data;

pub const ART_CHANNEL: &str = "com.samsung.art-app";
pub const DEFAULT_PORT: u16 = 8002;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CLIENT_NAME: &str = "TheFrame";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvEndpoint {
    pub host: String,
    pub port: u16,
    /// Pairing token; without one the TV shows a pairing prompt.
    pub token: Option<String>,
    /// Name shown on the TV's device list.
    pub client_name: String,
    /// `wss://` (the TV's real endpoint) or plain `ws://`.
    pub secure: bool,
    /// Upper bound for the handshake and for each request.
    pub timeout: Duration,
}

impl TvEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            token: None,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            secure: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Plain `ws://`, for local fakes.
    pub fn insecure(mut self) -> Self {
        self.secure = false;
        self
    }

    pub fn url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        let mut url = format!(
            "{scheme}://{}:{}/api/v2/channels/{ART_CHANNEL}?name={}",
            self.host,
            self.port,
            STANDARD.encode(self.client_name.as_bytes())
        );
        if let Some(token) = &self.token {
            url.push_str("&token=");
            url.push_str(token);
        }
        url
    }

    /// [`url`](Self::url) with the token masked, for logs.
    pub fn redacted_url(&self) -> String {
        redact_sensitive_data(&self.url())
    }
}
