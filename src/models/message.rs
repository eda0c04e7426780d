use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-issued (or provisional, while in flight) message identifier.
pub type MessageId = i64;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single chat message.
///
/// While `pending` or `streaming` is set the `id` is provisional and will be
/// replaced by the server-issued id once the owning operation resolves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    #[serde(deserialize_with = "crate::models::deserialize_id")]
    pub id: MessageId,
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_cached: Option<bool>,
    /// Optimistically inserted, awaiting server confirmation
    #[serde(default)]
    pub pending: bool,
    /// Still receiving fragments from the streaming channel
    #[serde(default)]
    pub streaming: bool,
    /// Local handle for a staged entry; never sent to or read from the server
    #[serde(skip)]
    pub correlation_id: Option<Uuid>,
}

/// Provisional id derived from the local clock.
pub fn provisional_id() -> MessageId {
    Utc::now().timestamp_millis()
}

impl Message {
    fn local(role: MessageRole, content: String) -> Self {
        Self {
            id: provisional_id(),
            role,
            content,
            created_at: Utc::now(),
            provider: None,
            model: None,
            tokens_used: None,
            latency_ms: None,
            was_cached: None,
            pending: false,
            streaming: false,
            correlation_id: None,
        }
    }

    /// A user message staged before server confirmation.
    pub fn pending_user(content: impl Into<String>, correlation_id: Uuid) -> Self {
        Self {
            pending: true,
            correlation_id: Some(correlation_id),
            ..Self::local(MessageRole::User, content.into())
        }
    }

    /// A user message that needs no confirmation (streaming sends).
    pub fn confirmed_user(content: impl Into<String>) -> Self {
        Self::local(MessageRole::User, content.into())
    }

    /// An assistant message seeded with the first streamed fragment.
    pub fn streaming_assistant(first_fragment: impl Into<String>) -> Self {
        Self {
            streaming: true,
            ..Self::local(MessageRole::Assistant, first_fragment.into())
        }
    }

    /// Stamp completion metadata and clear the streaming flag.
    pub fn seal(&mut self, meta: CompletionMeta) {
        self.id = meta.message_id;
        self.provider = meta.provider;
        self.model = meta.model;
        self.tokens_used = meta.tokens_used;
        self.latency_ms = meta.latency_ms;
        self.was_cached = Some(meta.was_cached);
        self.created_at = Utc::now();
        self.streaming = false;
    }
}

/// Metadata carried by a completion event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionMeta {
    pub message_id: MessageId,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
    pub latency_ms: Option<u64>,
    pub was_cached: bool,
}

/// Message histories come back either as a bare array or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MessageList {
    Wrapped { messages: Vec<Message> },
    Bare(Vec<Message>),
}

impl MessageList {
    pub fn into_vec(self) -> Vec<Message> {
        match self {
            MessageList::Wrapped { messages } => messages,
            MessageList::Bare(messages) => messages,
        }
    }
}
