//! Streaming-channel error types.
//!
//! Errors raised while talking to the assistant over the persistent
//! WebSocket channel. None of these are fatal; the supervisor keeps
//! reconnecting in the background.

use std::fmt;

/// Stream-specific error variants.
#[derive(Debug, Clone)]
pub enum StreamError {
    /// A streaming send was attempted while the channel was down.
    NotConnected,

    /// A streaming send was attempted while the previous reply was still
    /// arriving.
    ReplyInFlight,

    /// The channel dropped unexpectedly.
    ConnectionLost { message: String },

    /// The server closed the channel.
    ServerClosed {
        code: Option<u16>,
        reason: Option<String>,
    },

    /// The assistant reported an error through an `error` event.
    BackendError {
        code: Option<String>,
        message: String,
    },

    /// An outbound frame could not be written.
    SendFailed { message: String },

    /// A frame could not be encoded or decoded.
    InvalidJson { message: String },
}

impl StreamError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StreamError::NotConnected
                | StreamError::ReplyInFlight
                | StreamError::ConnectionLost { .. }
                | StreamError::ServerClosed { .. }
                | StreamError::SendFailed { .. }
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::NotConnected => {
                "Not connected to the assistant. Reconnecting, please try again shortly."
                    .to_string()
            }
            StreamError::ReplyInFlight => {
                "The assistant is still replying. Please wait for it to finish.".to_string()
            }
            StreamError::ConnectionLost { .. } => {
                "Connection to the assistant was lost. Reconnecting...".to_string()
            }
            StreamError::ServerClosed { reason, .. } => match reason {
                Some(r) if !r.is_empty() => format!("The server closed the connection: {}", r),
                _ => "The server closed the connection.".to_string(),
            },
            // The backend's text is already meant for the user.
            StreamError::BackendError { message, .. } => message.clone(),
            StreamError::SendFailed { .. } => {
                "Your message could not be sent. Please try again.".to_string()
            }
            StreamError::InvalidJson { .. } => {
                "Received invalid data from the assistant.".to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::NotConnected => "E_STREAM_NOT_CONN",
            StreamError::ReplyInFlight => "E_STREAM_BUSY",
            StreamError::ConnectionLost { .. } => "E_STREAM_LOST",
            StreamError::ServerClosed { .. } => "E_STREAM_CLOSED",
            StreamError::BackendError { .. } => "E_STREAM_BACKEND",
            StreamError::SendFailed { .. } => "E_STREAM_SEND",
            StreamError::InvalidJson { .. } => "E_STREAM_JSON",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::NotConnected => write!(f, "Streaming channel not connected"),
            StreamError::ReplyInFlight => write!(f, "Previous reply still streaming"),
            StreamError::ConnectionLost { message } => write!(f, "Connection lost: {}", message),
            StreamError::ServerClosed { code, reason } => {
                write!(f, "Server closed channel")?;
                if let Some(code) = code {
                    write!(f, " (code {})", code)?;
                }
                if let Some(reason) = reason {
                    write!(f, ": {}", reason)?;
                }
                Ok(())
            }
            StreamError::BackendError { code, message } => match code {
                Some(c) => write!(f, "Backend error [{}]: {}", c, message),
                None => write!(f, "Backend error: {}", message),
            },
            StreamError::SendFailed { message } => write!(f, "Send failed: {}", message),
            StreamError::InvalidJson { message } => write!(f, "Invalid JSON: {}", message),
        }
    }
}

impl std::error::Error for StreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_message_is_user_facing() {
        let err = StreamError::BackendError {
            code: Some("rate_limit".to_string()),
            message: "Model is overloaded".to_string(),
        };
        assert_eq!(err.user_message(), "Model is overloaded");
        assert_eq!(err.to_string(), "Backend error [rate_limit]: Model is overloaded");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_closed_display() {
        let err = StreamError::ServerClosed {
            code: Some(1011),
            reason: Some("internal".to_string()),
        };
        assert_eq!(err.to_string(), "Server closed channel (code 1011): internal");
        assert!(err.is_retryable());
    }
}
