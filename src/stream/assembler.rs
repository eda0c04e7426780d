//! Folds streaming-channel events into the session store.

use tracing::{debug, info, warn};

use crate::error::StreamError;
use crate::models::Session;
use crate::state::SessionStore;
use crate::websocket::WsIncomingMessage;

/// Shown when an `error` event carries no text of its own.
const UNSPECIFIED_BACKEND_ERROR: &str = "The assistant could not complete the reply.";

/// Applies inbound frames to a [`SessionStore`] strictly in arrival order.
///
/// The assembler never fabricates messages: fragments and completions with
/// no reply in flight are dropped, and unknown or malformed frames are only
/// logged.
#[derive(Debug, Clone)]
pub struct StreamAssembler {
    store: SessionStore,
    context_type: String,
    specialty: Option<String>,
}

impl StreamAssembler {
    /// `context_type` and `specialty` describe sessions the server
    /// acknowledges, since the acknowledgement only carries an id.
    pub fn new(
        store: SessionStore,
        context_type: impl Into<String>,
        specialty: Option<String>,
    ) -> Self {
        Self {
            store,
            context_type: context_type.into(),
            specialty,
        }
    }

    /// Decode and apply one text frame.
    pub fn apply_frame(&self, text: &str) {
        match WsIncomingMessage::parse(text) {
            Ok(msg) => self.apply(msg),
            Err(e) => warn!("Ignoring malformed frame: {} ({})", e, text),
        }
    }

    /// Apply one decoded event.
    pub fn apply(&self, msg: WsIncomingMessage) {
        match msg {
            WsIncomingMessage::Session(ack) => {
                let session = Session::acknowledged(
                    ack.session_id,
                    &self.context_type,
                    self.specialty.as_deref(),
                );
                if self.store.adopt_session(session) {
                    info!("Adopted session {} from server", ack.session_id);
                }
            }
            WsIncomingMessage::Chunk(chunk) => {
                if !self.store.append_fragment(&chunk.text) {
                    debug!("Fragment with no reply in flight, ignoring");
                }
            }
            WsIncomingMessage::Done(done) => {
                if !self.store.seal_streaming(done.to_completion_meta()) {
                    debug!(
                        "Completion for message {} with nothing streaming, ignoring",
                        done.message_id
                    );
                }
            }
            WsIncomingMessage::Error(event) => {
                let err = StreamError::BackendError {
                    code: event.code,
                    message: event
                        .message
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| UNSPECIFIED_BACKEND_ERROR.to_string()),
                };
                warn!("Assistant reported an error: {}", err);
                self.store.halt_streaming(Some(err.user_message()));
            }
            WsIncomingMessage::Pong(_) => {}
            WsIncomingMessage::Unknown => {
                debug!("Ignoring frame of unknown type");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, MessageRole};

    fn assembler() -> (StreamAssembler, SessionStore) {
        let store = SessionStore::new();
        (StreamAssembler::new(store.clone(), "general", None), store)
    }

    fn run(frames: &[&str]) -> SessionStore {
        let (assembler, store) = assembler();
        assert!(store.begin_streamed_reply(Message::confirmed_user("Symptoms?")));
        for frame in frames {
            assembler.apply_frame(frame);
            assert!(store.snapshot().streaming_count() <= 1);
        }
        store
    }

    #[test]
    fn test_fragments_then_completion() {
        let store = run(&[
            r#"{"type":"chunk","text":"Fever"}"#,
            r#"{"type":"chunk","text":" and cough"}"#,
            r#"{"type":"done","message_id":42,"cached":true}"#,
        ]);

        let state = store.snapshot();
        assert!(!state.streaming);
        let reply = state.messages.last().unwrap();
        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.id, 42);
        assert_eq!(reply.content, "Fever and cough");
        assert!(!reply.streaming);
        assert_eq!(reply.was_cached, Some(true));
    }

    #[test]
    fn test_fragment_boundaries_do_not_matter() {
        let whole = run(&[
            r#"{"type":"chunk","text":"Rest and fluids."}"#,
            r#"{"type":"done","message_id":1}"#,
        ]);
        let split = run(&[
            r#"{"type":"chunk","text":"Rest"}"#,
            r#"{"type":"chunk","text":" and "}"#,
            r#"{"type":"chunk","text":""}"#,
            r#"{"type":"chunk","text":"fluids."}"#,
            r#"{"type":"done","message_id":1}"#,
        ]);

        assert_eq!(
            whole.snapshot().messages.last().unwrap().content,
            split.snapshot().messages.last().unwrap().content
        );
    }

    #[test]
    fn test_repeated_fragments_are_not_deduplicated() {
        let store = run(&[
            r#"{"type":"chunk","text":"ha"}"#,
            r#"{"type":"chunk","text":"ha"}"#,
        ]);
        assert_eq!(store.snapshot().messages.last().unwrap().content, "haha");
    }

    #[test]
    fn test_completion_without_stream_is_noop() {
        let (assembler, store) = assembler();
        store.push_message(Message::confirmed_user("hi"));
        let before = store.snapshot().messages;

        assembler.apply_frame(r#"{"type":"done","message_id":9}"#);
        assert_eq!(store.snapshot().messages, before);
    }

    #[test]
    fn test_error_keeps_partial_content() {
        let store = run(&[
            r#"{"type":"chunk","text":"Possibly"}"#,
            r#"{"type":"error","message":"Model unavailable"}"#,
        ]);

        let state = store.snapshot();
        assert!(!state.streaming);
        assert_eq!(state.streaming_count(), 0);
        assert_eq!(state.messages.last().unwrap().content, "Possibly");
        assert_eq!(state.error.as_deref(), Some("Model unavailable"));
    }

    #[test]
    fn test_error_without_text_still_halts() {
        let store = run(&[
            r#"{"type":"chunk","text":"partial"}"#,
            r#"{"type":"error"}"#,
        ]);

        let state = store.snapshot();
        assert!(!state.streaming);
        assert_eq!(state.streaming_count(), 0);
        assert_eq!(state.messages.last().unwrap().content, "partial");
        assert_eq!(state.error.as_deref(), Some(UNSPECIFIED_BACKEND_ERROR));
    }

    #[test]
    fn test_error_text_under_detail() {
        let store = run(&[
            r#"{"type":"chunk","text":"partial"}"#,
            r#"{"type":"error","detail":"rate limited"}"#,
        ]);

        let state = store.snapshot();
        assert!(!state.streaming);
        assert_eq!(state.error.as_deref(), Some("rate limited"));
    }

    #[test]
    fn test_frames_after_session_change_are_dropped() {
        let (assembler, store) = assembler();
        store.begin_session(Session::acknowledged(1, "general", None));
        assert!(store.begin_streamed_reply(Message::confirmed_user("Symptoms?")));
        assembler.apply_frame(r#"{"type":"chunk","text":"reply to one "}"#);

        store.begin_session(Session::acknowledged(2, "general", None));
        assembler.apply_frame(r#"{"type":"chunk","text":"tail"}"#);
        assembler.apply_frame(r#"{"type":"done","message_id":99}"#);

        let state = store.snapshot();
        assert_eq!(state.current_session_id(), Some(2));
        assert!(state.messages.is_empty());
        assert!(!state.streaming);
    }

    #[test]
    fn test_session_ack_sets_current_once() {
        let (assembler, store) = assembler();
        assembler.apply_frame(r#"{"type":"session","session_id":12}"#);
        assembler.apply_frame(r#"{"type":"session","session_id":13}"#);

        let current = store.snapshot().current_session.unwrap();
        assert_eq!(current.id, 12);
        assert_eq!(current.context_type, "general");
    }

    #[test]
    fn test_pong_unknown_and_malformed_change_nothing() {
        let (assembler, store) = assembler();
        store.push_message(Message::confirmed_user("hi"));
        let before = store.snapshot();

        assembler.apply_frame(r#"{"type":"pong"}"#);
        assembler.apply_frame(r#"{"type":"typing"}"#);
        assembler.apply_frame("garbage");

        assert_eq!(store.snapshot(), before);
    }
}
