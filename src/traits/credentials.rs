//! Credentials provider trait abstraction.
//!
//! Provides a trait-based abstraction for credential retrieval,
//! enabling dependency injection and mocking in tests.

use async_trait::async_trait;
use tracing::warn;

use crate::auth::Credentials;

/// Credentials operation errors.
#[derive(Debug, Clone)]
pub enum CredentialsError {
    /// Failed to load credentials
    LoadFailed(String),
    /// IO error
    Io(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialsError::LoadFailed(msg) => write!(f, "Failed to load credentials: {}", msg),
            CredentialsError::Io(msg) => write!(f, "IO error: {}", msg),
            CredentialsError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            CredentialsError::Other(msg) => write!(f, "Credentials error: {}", msg),
        }
    }
}

impl std::error::Error for CredentialsError {}

/// Trait for credential retrieval.
///
/// Implementations include the file-based provider and an in-memory
/// provider for tests.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Load credentials from storage.
    ///
    /// # Returns
    /// - `Ok(Some(credentials))` if credentials exist
    /// - `Ok(None)` if nothing is stored
    /// - `Err(error)` if loading failed
    async fn load(&self) -> Result<Option<Credentials>, CredentialsError>;

    /// Current bearer token, or `None` if the user is not signed in.
    ///
    /// Load failures and expired tokens both count as "no token".
    async fn access_token(&self) -> Option<String> {
        match self.load().await {
            Ok(Some(creds)) if creds.is_usable() => creds.access_token,
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to load credentials: {}", e);
                None
            }
        }
    }
}
