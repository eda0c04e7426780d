use serde::{Deserialize, Serialize};

use crate::models::{CompletionMeta, MessageId, SessionId};
use crate::traits::WsError;

/// Incoming frames from the chat server.
///
/// Unrecognized `type` values decode to [`WsIncomingMessage::Unknown`] so a
/// newer server never breaks an older client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsIncomingMessage {
    /// Server acknowledged (or created) the chat session
    Session(WsSessionAck),
    /// Incremental piece of the assistant reply
    Chunk(WsChunk),
    /// Reply finished; carries the stored message id and usage metadata
    Done(WsDone),
    /// Generation or server-side failure
    Error(WsErrorEvent),
    /// Reply to a liveness ping
    Pong(WsPong),
    #[serde(other)]
    Unknown,
}

impl WsIncomingMessage {
    /// Decode one text frame.
    pub fn parse(text: &str) -> Result<Self, WsError> {
        serde_json::from_str(text).map_err(|e| WsError::ParseError(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WsSessionAck {
    #[serde(deserialize_with = "crate::models::deserialize_id")]
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WsChunk {
    #[serde(alias = "content")]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WsDone {
    #[serde(deserialize_with = "crate::models::deserialize_id")]
    pub message_id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, alias = "tokens", skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, alias = "was_cached")]
    pub cached: bool,
}

impl WsDone {
    pub fn to_completion_meta(&self) -> CompletionMeta {
        CompletionMeta {
            message_id: self.message_id,
            provider: self.provider.clone(),
            model: self.model.clone(),
            tokens_used: self.tokens_used,
            latency_ms: self.latency_ms,
            was_cached: self.cached,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WsErrorEvent {
    /// Some backends put the text under `error` or `detail`, some omit it
    #[serde(
        default,
        alias = "error",
        alias = "detail",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct WsPong {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// User message sent over the streaming channel
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WsChatMessage {
    /// `None` asks the server to open a session and acknowledge it
    pub session_id: Option<SessionId>,
    pub content: String,
    pub context_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    pub include_history: bool,
}

/// Outgoing frames (sent to server)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsOutgoingMessage {
    Message(WsChatMessage),
    Ping,
}

impl WsOutgoingMessage {
    /// Encode as a text frame.
    pub fn to_text(&self) -> Result<String, WsError> {
        serde_json::to_string(self).map_err(|e| WsError::ParseError(e.to_string()))
    }
}
