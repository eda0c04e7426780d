//! Controller configuration.

use std::time::Duration;

/// Default REST base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Default streaming channel URL.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws/ai/chat";

/// Close code that marks a deliberate disconnect (RFC 6455 normal closure).
pub const DELIBERATE_CLOSE_CODE: u16 = 1000;

/// How user messages reach the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// One request, one complete reply
    #[default]
    Rest,
    /// Replies arrive in fragments over the persistent channel
    Streaming,
}

/// Configuration for a [`ChatController`](crate::controller::ChatController).
///
/// Use the builder pattern to customize behavior.
///
/// # Example
///
/// ```
/// use clinic_chat::config::{ChatConfig, TransportMode};
///
/// let config = ChatConfig::default()
///     .with_transport(TransportMode::Streaming)
///     .with_specialty("cardiology");
/// assert_eq!(config.context_type, "general");
/// ```
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// REST base URL, without trailing slash
    pub api_base_url: String,
    /// Streaming channel URL; the token is appended as a query parameter
    pub ws_url: String,
    pub transport: TransportMode,
    /// Context for new sessions (default: "general")
    pub context_type: String,
    pub specialty: Option<String>,
    /// Ask the assistant to consider earlier messages (default: true)
    pub include_history: bool,
    /// Sessions fetched by `list_sessions` (default: 20)
    pub session_list_limit: usize,
    /// Delay before reconnecting after an unexpected close (default: 3s)
    pub reconnect_delay: Duration,
    /// Delay before retrying a connect that found no credential (default: 5s)
    pub auth_retry_delay: Duration,
    /// Liveness ping period while connected (default: 30s)
    pub ping_interval: Duration,
    pub deliberate_close_code: u16,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            transport: TransportMode::Rest,
            context_type: "general".to_string(),
            specialty: None,
            include_history: true,
            session_list_limit: 20,
            reconnect_delay: Duration::from_secs(3),
            auth_retry_delay: Duration::from_secs(5),
            ping_interval: Duration::from_secs(30),
            deliberate_close_code: DELIBERATE_CLOSE_CODE,
        }
    }
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the REST base URL. A trailing slash is dropped.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    pub fn with_transport(mut self, transport: TransportMode) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_context_type(mut self, context_type: impl Into<String>) -> Self {
        self.context_type = context_type.into();
        self
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    pub fn with_include_history(mut self, include: bool) -> Self {
        self.include_history = include;
        self
    }

    pub fn with_session_list_limit(mut self, limit: usize) -> Self {
        self.session_list_limit = limit;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_auth_retry_delay(mut self, delay: Duration) -> Self {
        self.auth_retry_delay = delay;
        self
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Create config from environment variables.
    ///
    /// - `CLINIC_API_URL` overrides the REST base URL
    /// - `CLINIC_WS_URL` overrides the streaming channel URL
    /// - `CLINIC_CHAT_STREAMING=1` selects the streaming transport
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CLINIC_API_URL") {
            config = config.with_api_base_url(url);
        }
        if let Ok(url) = std::env::var("CLINIC_WS_URL") {
            config = config.with_ws_url(url);
        }
        if std::env::var("CLINIC_CHAT_STREAMING").is_ok_and(|v| v == "1") {
            config = config.with_transport(TransportMode::Streaming);
        }

        config
    }
}
