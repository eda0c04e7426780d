//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (GET, POST, PUT, DELETE)
//! - [`ChannelFactory`] / [`StreamChannel`] - streaming channel management
//! - [`CredentialsProvider`] - credential retrieval

pub mod credentials;
pub mod http;
pub mod websocket;

pub use credentials::{CredentialsError, CredentialsProvider};
pub use http::{Headers, HttpClient, HttpError, Response};
pub use websocket::{ChannelEvent, ChannelFactory, ChannelHandle, StreamChannel, WsError};
