//! Error category classification for unified error handling.
//!
//! Categories let the controller decide how an error is surfaced: whether it
//! is worth retrying, and what hint to show next to the message.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection, DNS or timeout problems. Generally transient.
    Network,

    /// Missing or rejected credentials.
    Auth,

    /// Backend-side failures (HTTP 5xx, error events from the assistant).
    Server,

    /// Malformed data or protocol misuse. Not retryable.
    Client,

    /// The caller must act first (e.g. wait for the channel to connect).
    User,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::User => "user",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check your connection to the clinic server and try again",
            ErrorCategory::Auth => "Sign in again to continue the conversation",
            ErrorCategory::Server => "The assistant service may be busy. Please try again shortly",
            ErrorCategory::Client => "This may be a bug. Please report it if it persists",
            ErrorCategory::User => "Please wait a moment and try again",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
