//! Authentication credentials.
//!
//! Sign-in and token refresh belong to the wider application; this crate
//! only reads the bearer token it needs for API calls and the streaming
//! channel.

pub mod credentials;

pub use credentials::{Credentials, CredentialsManager};
