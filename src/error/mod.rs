//! Unified error handling for the chat controller.
//!
//! Errors fall into four groups:
//!
//! | Kind | Source | Recovery |
//! |------|--------|----------|
//! | Request failure | REST call rejected or non-2xx | optimistic state rolled back, message surfaced |
//! | Stream failure | `error` event, channel close/error | streaming halted, partial content kept |
//! | Auth unavailable | no credential when connecting | connect deferred, nothing surfaced |
//! | Protocol anomaly | unknown event, stray completion | logged and swallowed |
//!
//! Only the first two ever reach [`ChatError`]; the rest are handled where
//! they occur.

mod auth;
mod category;
mod chat_error;
mod context;
mod network;
mod result;
mod stream;

pub use auth::AuthError;
pub use category::ErrorCategory;
pub use chat_error::ChatError;
pub use context::ErrorContext;
pub use network::NetworkError;
pub use result::{ChatResult, ResultExt};
pub use stream::StreamError;
