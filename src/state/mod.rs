//! Conversation state management
//!
//! - [`SessionStore`]: the observable [`ChatState`] of one controller
//! - [`RequestTracker`]: discards responses of superseded REST calls

pub mod request_tracker;
pub mod session_store;

pub use request_tracker::{RequestKind, RequestToken, RequestTracker};
pub use session_store::{ChatState, LoadingGuard, SessionStore};
