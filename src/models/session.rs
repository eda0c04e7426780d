use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-issued chat session identifier.
pub type SessionId = i64;

/// A conversation context grouping an ordered list of messages.
///
/// Sessions are immutable once created; a newer session supersedes the
/// current one without deleting it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    #[serde(deserialize_with = "crate::models::deserialize_id")]
    pub id: SessionId,
    /// Clinical context the conversation runs in (e.g. "general", "diagnosis")
    #[serde(default = "default_context_type")]
    pub context_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_context_type() -> String {
    "general".to_string()
}

impl Session {
    /// Build a session for an id acknowledged by the streaming channel.
    ///
    /// The channel only reports the id, so context metadata comes from the
    /// caller's configuration.
    pub fn acknowledged(id: SessionId, context_type: &str, specialty: Option<&str>) -> Self {
        Self {
            id,
            context_type: context_type.to_string(),
            specialty: specialty.map(str::to_string),
            created_at: Utc::now(),
        }
    }
}

/// Session listings come back either as a bare array or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SessionList {
    Wrapped { sessions: Vec<Session> },
    Bare(Vec<Session>),
}

impl SessionList {
    pub fn into_vec(self) -> Vec<Session> {
        match self {
            SessionList::Wrapped { sessions } => sessions,
            SessionList::Bare(sessions) => sessions,
        }
    }
}
