//! Streaming channel trait abstraction.
//!
//! A channel factory opens one bidirectional text channel per call. The
//! returned [`ChannelHandle`] splits it into a writer half and an ordered
//! stream of [`ChannelEvent`]s, enabling dependency injection and mocking
//! in tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Streaming channel errors.
#[derive(Debug, Clone)]
pub enum WsError {
    /// Connection failed
    ConnectionFailed(String),
    /// Channel is not open
    Disconnected,
    /// Failed to send a frame
    SendFailed(String),
    /// Failed to encode or parse a frame
    ParseError(String),
}

impl std::fmt::Display for WsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WsError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            WsError::Disconnected => write!(f, "Disconnected from server"),
            WsError::SendFailed(msg) => write!(f, "Send failed: {}", msg),
            WsError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for WsError {}

/// Something that happened on an open channel, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A text frame from the server
    Text(String),
    /// The channel was closed, by either side
    Closed {
        code: Option<u16>,
        reason: Option<String>,
    },
    /// Transport-level failure; the channel is unusable afterwards
    Error(String),
}

/// Writer half of an open channel.
#[async_trait]
pub trait StreamChannel: Send + Sync {
    /// Send one text frame.
    async fn send_text(&self, text: String) -> Result<(), WsError>;

    /// Close the channel with the given close code.
    async fn close(&self, code: u16, reason: &str) -> Result<(), WsError>;
}

/// An opened channel: writer plus ordered inbound events.
///
/// When `events` yields `None` the channel is gone and should be treated
/// like a close without a code.
pub struct ChannelHandle {
    pub channel: Box<dyn StreamChannel>,
    pub events: mpsc::Receiver<ChannelEvent>,
}

impl std::fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelHandle").finish_non_exhaustive()
    }
}

/// Trait for opening streaming channels.
///
/// The URL already carries the credential as a query parameter. Returning
/// `Ok` means the channel is open.
#[async_trait]
pub trait ChannelFactory: Send + Sync {
    async fn connect(&self, url: &str) -> Result<ChannelHandle, WsError>;
}
