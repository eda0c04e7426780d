//! Unified error type for the chat controller.

use std::fmt;

use super::auth::AuthError;
use super::category::ErrorCategory;
use super::context::ErrorContext;
use super::network::NetworkError;
use super::stream::StreamError;
use crate::traits::{HttpError, WsError};

/// Unified error type for chat operations.
///
/// Request failures (REST), stream failures (WebSocket) and missing
/// credentials all flow through this type. Its [`user_message`] is the
/// string surfaced in the controller's `error` field.
///
/// [`user_message`]: ChatError::user_message
#[derive(Debug)]
pub enum ChatError {
    /// Request/response failures.
    Network(NetworkError),

    /// Authentication errors.
    Auth(AuthError),

    /// Streaming channel errors.
    Stream(StreamError),

    /// Wrapped error with additional context.
    WithContext {
        error: Box<ChatError>,
        context: ErrorContext,
    },
}

impl ChatError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::Network(NetworkError::HttpStatus { status, .. }) if *status < 500 => {
                ErrorCategory::Client
            }
            ChatError::Network(NetworkError::HttpStatus { .. }) => ErrorCategory::Server,
            ChatError::Network(NetworkError::InvalidResponse { .. }) => ErrorCategory::Client,
            ChatError::Network(NetworkError::Superseded { .. }) => ErrorCategory::User,
            ChatError::Network(_) => ErrorCategory::Network,
            ChatError::Auth(_) => ErrorCategory::Auth,
            ChatError::Stream(err) => match err {
                StreamError::NotConnected | StreamError::ReplyInFlight => ErrorCategory::User,
                StreamError::ConnectionLost { .. } | StreamError::SendFailed { .. } => {
                    ErrorCategory::Network
                }
                StreamError::ServerClosed { .. } | StreamError::BackendError { .. } => {
                    ErrorCategory::Server
                }
                StreamError::InvalidJson { .. } => ErrorCategory::Client,
            },
            ChatError::WithContext { error, .. } => error.category(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Network(err) => err.is_retryable(),
            ChatError::Auth(_) => false,
            ChatError::Stream(err) => err.is_retryable(),
            ChatError::WithContext { error, .. } => error.is_retryable(),
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Network(err) => err.user_message(),
            ChatError::Auth(err) => err.user_message(),
            ChatError::Stream(err) => err.user_message(),
            ChatError::WithContext { error, .. } => error.user_message(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ChatError::Network(err) => err.error_code(),
            ChatError::Auth(err) => err.error_code(),
            ChatError::Stream(err) => err.error_code(),
            ChatError::WithContext { error, .. } => error.error_code(),
        }
    }

    /// Attach context to this error.
    pub fn with_context(self, ctx: ErrorContext) -> Self {
        ChatError::WithContext {
            error: Box::new(self),
            context: ctx,
        }
    }

    /// Get the context if this error has one attached.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ChatError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Get the inner error without context.
    pub fn inner(&self) -> &ChatError {
        match self {
            ChatError::WithContext { error, .. } => error.inner(),
            _ => self,
        }
    }

    /// Check if this error requires re-authentication.
    pub fn requires_reauth(&self) -> bool {
        match self {
            ChatError::Auth(err) => err.requires_reauth(),
            ChatError::WithContext { error, .. } => error.requires_reauth(),
            _ => false,
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Network(err) => write!(f, "{}", err),
            ChatError::Auth(err) => write!(f, "{}", err),
            ChatError::Stream(err) => write!(f, "{}", err),
            ChatError::WithContext { error, context } => write!(f, "{} ({})", error, context),
        }
    }
}

impl std::error::Error for ChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatError::Network(err) => Some(err),
            ChatError::Auth(err) => Some(err),
            ChatError::Stream(err) => Some(err),
            ChatError::WithContext { error, .. } => error.source(),
        }
    }
}

impl From<NetworkError> for ChatError {
    fn from(err: NetworkError) -> Self {
        ChatError::Network(err)
    }
}

impl From<AuthError> for ChatError {
    fn from(err: AuthError) -> Self {
        ChatError::Auth(err)
    }
}

impl From<StreamError> for ChatError {
    fn from(err: StreamError) -> Self {
        ChatError::Stream(err)
    }
}

impl From<HttpError> for ChatError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Unauthorized(message) => ChatError::Auth(AuthError::Unauthorized { message }),
            HttpError::ServerError { status, message } => {
                ChatError::Network(NetworkError::HttpStatus { status, message })
            }
            HttpError::ConnectionFailed(message) => {
                ChatError::Network(NetworkError::ConnectionFailed { message })
            }
            HttpError::Timeout(operation) => ChatError::Network(NetworkError::Timeout { operation }),
            HttpError::InvalidUrl(message) | HttpError::Other(message) => {
                ChatError::Network(NetworkError::Other { message })
            }
        }
    }
}

impl From<WsError> for ChatError {
    fn from(err: WsError) -> Self {
        match err {
            WsError::ConnectionFailed(message) => {
                ChatError::Stream(StreamError::ConnectionLost { message })
            }
            WsError::Disconnected => ChatError::Stream(StreamError::NotConnected),
            WsError::SendFailed(message) => ChatError::Stream(StreamError::SendFailed { message }),
            WsError::ParseError(message) => ChatError::Stream(StreamError::InvalidJson { message }),
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Network(NetworkError::InvalidResponse {
            message: err.to_string(),
        })
    }
}
