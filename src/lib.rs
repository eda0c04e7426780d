//! Clinic chat - conversational client controller for the clinic assistant.
//!
//! [`controller::ChatController`] is the entry point. It keeps the
//! conversation in a [`state::SessionStore`], talks to the backend over
//! REST ([`chat_api`]) and optionally streams replies over a supervised
//! channel ([`websocket`], [`stream`]).

pub mod adapters;
pub mod auth;
pub mod chat_api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod stream;
pub mod traits;
pub mod websocket;

pub use config::{ChatConfig, TransportMode};
pub use controller::ChatController;
pub use error::{ChatError, ChatResult};
pub use state::ChatState;
