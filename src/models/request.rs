use serde::{Deserialize, Serialize};

use super::message::Message;

/// Body for `POST /ai/chat/sessions`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateSessionRequest {
    pub context_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

/// Body for `POST /ai/chat/sessions/{id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendMessageRequest {
    pub content: String,
    pub include_history: bool,
}

/// Kind of feedback a clinician can leave on an assistant reply
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Helpful,
    NotHelpful,
    Incorrect,
    Inappropriate,
}

impl std::str::FromStr for FeedbackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "helpful" => Ok(FeedbackType::Helpful),
            "not_helpful" => Ok(FeedbackType::NotHelpful),
            "incorrect" => Ok(FeedbackType::Incorrect),
            "inappropriate" => Ok(FeedbackType::Inappropriate),
            other => Err(format!("Unknown feedback type: {}", other)),
        }
    }
}

/// Body for `POST /ai/chat/messages/{id}/feedback`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRequest {
    pub feedback_type: FeedbackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Reply to a REST send.
///
/// Newer backends return both the stored user message and the assistant
/// reply; older ones only return the assistant message.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SendMessageResponse {
    Exchange {
        #[serde(default)]
        user_message: Option<Message>,
        assistant_message: Message,
    },
    AssistantOnly(Message),
}

impl SendMessageResponse {
    /// Split into the confirmed user message (if the server sent one) and
    /// the assistant reply.
    pub fn into_parts(self) -> (Option<Message>, Message) {
        match self {
            SendMessageResponse::Exchange {
                user_message,
                assistant_message,
            } => (user_message, assistant_message),
            SendMessageResponse::AssistantOnly(message) => (None, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    #[test]
    fn test_create_session_request_omits_missing_specialty() {
        let req = CreateSessionRequest {
            context_type: "general".to_string(),
            specialty: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["context_type"], "general");
        assert!(json.get("specialty").is_none());
    }

    #[test]
    fn test_feedback_type_wire_names() {
        let req = FeedbackRequest {
            feedback_type: FeedbackType::NotHelpful,
            comment: Some("missing dosage".to_string()),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["feedback_type"], "not_helpful");
        assert_eq!(json["comment"], "missing dosage");
    }

    #[test]
    fn test_feedback_type_from_str() {
        assert_eq!("helpful".parse::<FeedbackType>(), Ok(FeedbackType::Helpful));
        assert_eq!(
            "inappropriate".parse::<FeedbackType>(),
            Ok(FeedbackType::Inappropriate)
        );
        assert!("great".parse::<FeedbackType>().is_err());
    }

    #[test]
    fn test_send_response_exchange_shape() {
        let json = r#"{
            "user_message": {"id": 6, "role": "user", "content": "Hello"},
            "assistant_message": {"id": 7, "role": "assistant", "content": "Hi"}
        }"#;
        let (user, assistant) = serde_json::from_str::<SendMessageResponse>(json)
            .unwrap()
            .into_parts();
        assert_eq!(user.map(|m| m.id), Some(6));
        assert_eq!(assistant.id, 7);
        assert_eq!(assistant.role, MessageRole::Assistant);
    }

    #[test]
    fn test_send_response_bare_assistant_shape() {
        let json = r#"{"id": 7, "role": "assistant", "content": "Hi"}"#;
        let (user, assistant) = serde_json::from_str::<SendMessageResponse>(json)
            .unwrap()
            .into_parts();
        assert!(user.is_none());
        assert_eq!(assistant.content, "Hi");
    }
}
