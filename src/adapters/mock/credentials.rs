//! In-memory credentials provider for testing.
//!
//! Provides a credentials provider that stores credentials in memory,
//! suitable for testing without file system access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::auth::Credentials;
use crate::traits::{CredentialsError, CredentialsProvider};

/// In-memory credentials provider for testing.
///
/// Clones share the stored credentials, so a test can sign the user in
/// or out while a controller is running.
///
/// # Example
///
/// ```
/// use clinic_chat::adapters::mock::InMemoryCredentials;
/// use clinic_chat::auth::Credentials;
///
/// let provider = InMemoryCredentials::new();
/// assert!(provider.get_credentials().is_none());
///
/// provider.set_credentials(Some(Credentials::with_token("test-token")));
/// assert!(provider.get_credentials().unwrap().has_token());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentials {
    /// Stored credentials
    credentials: Arc<Mutex<Option<Credentials>>>,
    /// Whether load should fail
    load_should_fail: Arc<Mutex<bool>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryCredentials {
    /// Create a provider with nothing stored.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with initial credentials.
    pub fn with_credentials(creds: Credentials) -> Self {
        let provider = Self::new();
        provider.set_credentials(Some(creds));
        provider
    }

    /// Create a provider holding a non-expiring access token.
    pub fn with_token(token: &str) -> Self {
        Self::with_credentials(Credentials::with_token(token))
    }

    /// Configure whether load should fail.
    pub fn set_load_should_fail(&self, should_fail: bool) {
        *lock(&self.load_should_fail) = should_fail;
    }

    /// Get the current credentials synchronously (for testing).
    pub fn get_credentials(&self) -> Option<Credentials> {
        lock(&self.credentials).clone()
    }

    /// Set credentials synchronously (for testing).
    pub fn set_credentials(&self, creds: Option<Credentials>) {
        *lock(&self.credentials) = creds;
    }
}

#[async_trait]
impl CredentialsProvider for InMemoryCredentials {
    async fn load(&self) -> Result<Option<Credentials>, CredentialsError> {
        if *lock(&self.load_should_fail) {
            return Err(CredentialsError::LoadFailed("Mock load failure".to_string()));
        }

        Ok(self.get_credentials())
    }
}
