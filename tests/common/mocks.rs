//! Mock adapters and canned backend payloads.

pub use clinic_chat::adapters::mock::{
    InMemoryCredentials, MockChannelFactory, MockHttpClient, MockResponse, RecordedRequest,
};

use serde_json::{json, Value};

/// A session row as the backend returns it.
pub fn session_json(id: i64) -> Value {
    json!({
        "id": id,
        "context_type": "general",
        "created_at": "2026-01-05T10:00:00Z"
    })
}

/// A stored message as the backend returns it.
pub fn message_json(id: i64, role: &str, content: &str) -> Value {
    json!({
        "id": id,
        "role": role,
        "content": content,
        "created_at": "2026-01-05T10:00:05Z"
    })
}

/// `{"detail": ...}` error body used by the backend for 4xx/5xx.
pub fn detail_json(detail: &str) -> Value {
    json!({ "detail": detail })
}
