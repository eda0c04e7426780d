//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`TungsteniteChannelFactory`] - streaming channels using tokio-tungstenite
//! - [`FileCredentialsProvider`] - File-based credentials storage
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for all adapters:
//! - [`mock::MockHttpClient`] - Configurable HTTP responses
//! - [`mock::MockChannelFactory`] - Frame injection and close simulation
//! - [`mock::InMemoryCredentials`] - In-memory credential storage

pub mod file_credentials;
pub mod mock;
pub mod reqwest_http;
pub mod tungstenite_ws;

pub use file_credentials::FileCredentialsProvider;
pub use mock::{InMemoryCredentials, MockChannelFactory, MockHttpClient};
pub use reqwest_http::ReqwestHttpClient;
pub use tungstenite_ws::TungsteniteChannelFactory;
