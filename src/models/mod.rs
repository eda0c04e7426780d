mod message;
mod request;
mod session;

pub(crate) use message::MessageList;
pub use message::{provisional_id, CompletionMeta, Message, MessageId, MessageRole};
pub use request::{
    CreateSessionRequest, FeedbackRequest, FeedbackType, SendMessageRequest, SendMessageResponse,
};
pub(crate) use session::SessionList;
pub use session::{Session, SessionId};

use serde::Deserializer;

/// Helper to deserialize an id sent as either an integer or a numeric string
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or numeric string")
        }

        fn visit_str<E>(self, value: &str) -> Result<i64, E>
        where
            E: de::Error,
        {
            value
                .trim()
                .parse::<i64>()
                .map_err(|_| E::custom(format!("invalid id: {}", value)))
        }

        fn visit_i64<E>(self, value: i64) -> Result<i64, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<i64, E>
        where
            E: de::Error,
        {
            i64::try_from(value).map_err(|_| E::custom(format!("id out of range: {}", value)))
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
