//! Mock implementations for testing.
//!
//! This module provides mock implementations of all trait abstractions,
//! enabling unit testing without network dependencies or file system access.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with configurable responses
//! - [`MockChannelFactory`] - streaming channels driven by the test
//! - [`InMemoryCredentials`] - In-memory credential storage

pub mod credentials;
pub mod http;
pub mod websocket;

pub use credentials::InMemoryCredentials;
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use websocket::MockChannelFactory;
