//! File-based credentials provider adapter.
//!
//! This module provides a credentials provider implementation that uses
//! [`CredentialsManager`] for file-based storage.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::auth::{Credentials, CredentialsManager};
use crate::traits::{CredentialsError, CredentialsProvider};

/// File-based credentials provider.
///
/// Credentials are read from `~/.clinic/credentials.json` on every load,
/// so a token written by the sign-in flow is picked up by the next
/// request or connect attempt.
#[derive(Debug)]
pub struct FileCredentialsProvider {
    manager: CredentialsManager,
}

impl FileCredentialsProvider {
    /// Create a provider for the default credentials file.
    ///
    /// # Returns
    /// The provider, or an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, CredentialsError> {
        CredentialsManager::new()
            .map(|manager| Self { manager })
            .ok_or_else(|| {
                CredentialsError::Other("Failed to determine home directory".to_string())
            })
    }

    /// Create a provider for an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            manager: CredentialsManager::with_path(path),
        }
    }

    /// Get the path to the credentials file.
    pub fn credentials_path(&self) -> &PathBuf {
        self.manager.credentials_path()
    }
}

#[async_trait]
impl CredentialsProvider for FileCredentialsProvider {
    async fn load(&self) -> Result<Option<Credentials>, CredentialsError> {
        let creds = self.manager.load()?;
        Ok(creds.filter(|c| *c != Credentials::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn provider_in(dir: &TempDir) -> FileCredentialsProvider {
        FileCredentialsProvider::with_path(dir.path().join("credentials.json"))
    }

    #[test]
    fn test_default_path_ends_with_credentials_file() {
        let Ok(provider) = FileCredentialsProvider::new() else {
            return;
        };
        assert!(provider.credentials_path().ends_with(".clinic/credentials.json"));
    }

    #[tokio::test]
    async fn test_missing_file_has_no_token() {
        let dir = TempDir::new().unwrap();
        let provider = provider_in(&dir);
        assert!(provider.load().await.unwrap().is_none());
        assert!(provider.access_token().await.is_none());
    }

    #[tokio::test]
    async fn test_reads_token_written_after_creation() {
        let dir = TempDir::new().unwrap();
        let provider = provider_in(&dir);
        assert!(provider.access_token().await.is_none());

        CredentialsManager::with_path(provider.credentials_path().clone())
            .save(&Credentials::with_token("from-sign-in"))
            .unwrap();

        assert_eq!(
            provider.access_token().await.as_deref(),
            Some("from-sign-in")
        );
    }

    #[tokio::test]
    async fn test_empty_credentials_count_as_absent() {
        let dir = TempDir::new().unwrap();
        let provider = provider_in(&dir);
        std::fs::write(provider.credentials_path(), "{}").unwrap();

        assert!(provider.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_token_is_not_used() {
        let dir = TempDir::new().unwrap();
        let provider = provider_in(&dir);
        let mut creds = Credentials::with_token("old");
        creds.expires_at = Some(1);
        CredentialsManager::with_path(provider.credentials_path().clone())
            .save(&creds)
            .unwrap();

        assert!(provider.load().await.unwrap().is_some());
        assert!(provider.access_token().await.is_none());
    }
}
