//! Streaming channel to the clinic assistant.
//!
//! [`messages`] defines the JSON text frames; [`supervisor`] keeps one
//! channel alive per controller, reconnecting after unexpected closes.

pub mod messages;
pub mod supervisor;

pub use messages::{
    WsChatMessage, WsChunk, WsDone, WsErrorEvent, WsIncomingMessage, WsOutgoingMessage, WsPong,
    WsSessionAck,
};
pub use supervisor::{ConnectionSupervisor, SupervisorSettings, WsConnectionState};
