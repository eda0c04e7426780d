//! Common fixtures for integration tests.
//!
//! ```ignore
//! mod common;
//! use common::TestHarness;
//!
//! let h = TestHarness::rest();
//! h.http.set_response("GET", &common::api_url("/ai/chat/sessions?limit=20"), ...);
//! ```

#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use std::sync::Arc;
use std::time::Duration;

use clinic_chat::auth::Credentials;
use clinic_chat::config::{ChatConfig, TransportMode};
use clinic_chat::controller::ChatController;
use clinic_chat::websocket::WsConnectionState;

pub const BASE_URL: &str = "http://clinic.test/api";
pub const WS_URL: &str = "ws://clinic.test/ws/ai/chat";
pub const TOKEN: &str = "test-access-token-12345";

pub fn api_url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

/// Credentials that won't expire during test execution.
pub fn test_credentials() -> Credentials {
    Credentials {
        access_token: Some(TOKEN.to_string()),
        refresh_token: Some("test-refresh-token-67890".to_string()),
        expires_at: Some(i64::MAX),
    }
}

pub fn test_config(transport: TransportMode) -> ChatConfig {
    ChatConfig::default()
        .with_api_base_url(BASE_URL)
        .with_ws_url(WS_URL)
        .with_transport(transport)
}

/// A controller wired to mock adapters, with handles to drive them.
pub struct TestHarness {
    pub http: MockHttpClient,
    pub channels: MockChannelFactory,
    pub credentials: InMemoryCredentials,
    pub controller: ChatController,
}

impl TestHarness {
    pub fn new(config: ChatConfig) -> Self {
        let http = MockHttpClient::new();
        let channels = MockChannelFactory::new();
        let credentials = InMemoryCredentials::with_credentials(test_credentials());
        let controller = ChatController::new(
            config,
            Arc::new(http.clone()),
            Arc::new(channels.clone()),
            Arc::new(credentials.clone()),
        );
        Self {
            http,
            channels,
            credentials,
            controller,
        }
    }

    pub fn rest() -> Self {
        Self::new(test_config(TransportMode::Rest))
    }

    /// Streaming harness, already activated.
    pub fn streaming() -> Self {
        let mut h = Self::new(test_config(TransportMode::Streaming));
        h.controller.activate();
        h
    }

    /// Wait until the supervised channel reports `Connected`.
    pub async fn wait_connected(&self) {
        self.wait_for_connection(|s| s.is_connected()).await;
    }

    pub async fn wait_for_connection(&self, f: impl Fn(&WsConnectionState) -> bool) {
        let mut rx = self
            .controller
            .connection_state_receiver()
            .expect("controller not activated");
        tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| f(s)))
            .await
            .expect("timed out waiting for connection state")
            .expect("supervisor stopped");
    }

    /// Wait until the controller state satisfies `f`.
    pub async fn wait_for_state(&self, f: impl Fn(&clinic_chat::ChatState) -> bool) {
        let mut rx = self.controller.subscribe();
        tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| f(s)))
            .await
            .expect("timed out waiting for chat state")
            .expect("store dropped");
    }
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
