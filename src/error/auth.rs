//! Authentication-related error types.

use std::fmt;

/// Authentication-specific error variants.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No credential is available (user not signed in yet).
    NotAuthenticated,

    /// The server rejected the bearer credential (HTTP 401).
    Unauthorized { message: String },

    /// Credentials could not be loaded from storage.
    CredentialsLoadFailed { message: String },
}

impl AuthError {
    /// Check if this error might be resolved by re-authenticating.
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            AuthError::NotAuthenticated | AuthError::Unauthorized { .. }
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::NotAuthenticated => {
                "You are not signed in. Please sign in to use the assistant.".to_string()
            }
            AuthError::Unauthorized { .. } => {
                "Your session has expired. Please sign in again.".to_string()
            }
            AuthError::CredentialsLoadFailed { .. } => {
                "Could not load your credentials. Please sign in again.".to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "E_AUTH_NOT_AUTH",
            AuthError::Unauthorized { .. } => "E_AUTH_UNAUTHORIZED",
            AuthError::CredentialsLoadFailed { .. } => "E_AUTH_CRED_LOAD",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NotAuthenticated => write!(f, "Not authenticated"),
            AuthError::Unauthorized { message } => write!(f, "Unauthorized: {}", message),
            AuthError::CredentialsLoadFailed { message } => {
                write!(f, "Failed to load credentials: {}", message)
            }
        }
    }
}

impl std::error::Error for AuthError {}
