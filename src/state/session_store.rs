//! Observable conversation state.
//!
//! [`SessionStore`] owns the single [`ChatState`] of a controller. Every
//! mutation goes through one of its methods and is published to subscribers
//! as a whole snapshot, so observers never see half of an update.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::models::{CompletionMeta, Message, MessageRole, Session, SessionId};

/// Snapshot of everything a chat surface renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    /// Known sessions, most recent first
    pub sessions: Vec<Session>,
    pub current_session: Option<Session>,
    /// Chronological conversation of the current session
    pub messages: Vec<Message>,
    /// A REST call is in flight
    pub loading: bool,
    /// A streamed reply is in flight
    pub streaming: bool,
    /// Last user-visible error
    pub error: Option<String>,
    /// Streaming channel is open
    pub connected: bool,
    in_flight: usize,
}

impl ChatState {
    pub fn current_session_id(&self) -> Option<SessionId> {
        self.current_session.as_ref().map(|s| s.id)
    }

    /// Number of messages currently flagged as streaming.
    pub fn streaming_count(&self) -> usize {
        self.messages.iter().filter(|m| m.streaming).count()
    }
}

/// Shared handle to a controller's [`ChatState`].
///
/// Cloning the store clones the handle; all clones mutate the same state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<ChatState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ChatState::default());
        Self {
            state: Arc::new(tx),
        }
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> ChatState {
        self.state.borrow().clone()
    }

    /// Read from the current state without cloning all of it.
    pub fn read<R>(&self, f: impl FnOnce(&ChatState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Receiver notified after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    // ============= Sessions =============

    pub fn set_sessions(&self, sessions: Vec<Session>) {
        self.state.send_modify(|s| s.sessions = sessions);
    }

    /// Make `session` current with an empty conversation and list it first.
    ///
    /// A reply still streaming into the previous conversation is abandoned.
    pub fn begin_session(&self, session: Session) {
        self.state.send_modify(|s| {
            s.sessions.retain(|existing| existing.id != session.id);
            s.sessions.insert(0, session.clone());
            s.current_session = Some(session);
            s.messages.clear();
            end_reply(s);
        });
    }

    /// Adopt a server-acknowledged session id unless one is already current.
    ///
    /// Returns `true` if the id was adopted.
    pub fn adopt_session(&self, session: Session) -> bool {
        self.state.send_if_modified(|s| {
            if s.current_session.is_some() {
                return false;
            }
            if !s.sessions.iter().any(|existing| existing.id == session.id) {
                s.sessions.insert(0, session.clone());
            }
            s.current_session = Some(session);
            true
        })
    }

    /// Swap in a loaded session and its history in one update.
    ///
    /// A reply still streaming into the previous conversation is abandoned.
    pub fn replace_conversation(&self, session: Session, messages: Vec<Message>) {
        self.state.send_modify(|s| {
            s.current_session = Some(session);
            s.messages = messages;
            end_reply(s);
        });
    }

    /// Remove a session from the list. If it was current, the current
    /// session and its messages are cleared too.
    ///
    /// Returns `true` if the removed session was current.
    pub fn remove_session(&self, id: SessionId) -> bool {
        let mut was_current = false;
        self.state.send_modify(|s| {
            s.sessions.retain(|session| session.id != id);
            if s.current_session_id() == Some(id) {
                s.current_session = None;
                s.messages.clear();
                end_reply(s);
                was_current = true;
            }
        });
        was_current
    }

    // ============= Optimistic sends =============

    /// Append a pending user message and return its correlation id.
    pub fn stage_user_message(&self, content: &str) -> Uuid {
        let correlation_id = Uuid::new_v4();
        self.state
            .send_modify(|s| s.messages.push(Message::pending_user(content, correlation_id)));
        correlation_id
    }

    /// Settle a staged message with the server's reply.
    ///
    /// The staged entry is replaced in place by `confirmed` (or, when the
    /// server did not echo the user message, simply marked as no longer
    /// pending) and `reply` is appended, all in one update. Returns `false`
    /// if the staged entry is gone, e.g. because the conversation was cleared
    /// while the request was in flight; nothing is applied in that case.
    pub fn commit_staged(
        &self,
        correlation_id: Uuid,
        confirmed: Option<Message>,
        reply: Message,
    ) -> bool {
        self.state.send_if_modified(|s| {
            let Some(pos) = s
                .messages
                .iter()
                .position(|m| m.correlation_id == Some(correlation_id))
            else {
                debug!("Staged message {} no longer present, dropping reply", correlation_id);
                return false;
            };

            match confirmed {
                Some(mut user) => {
                    user.pending = false;
                    user.correlation_id = None;
                    s.messages[pos] = user;
                }
                None => {
                    let staged = &mut s.messages[pos];
                    staged.pending = false;
                    staged.correlation_id = None;
                }
            }
            s.messages.push(reply);
            true
        })
    }

    /// Remove a staged message after a failed send.
    pub fn rollback_staged(&self, correlation_id: Uuid) -> bool {
        self.state.send_if_modified(|s| {
            let before = s.messages.len();
            s.messages
                .retain(|m| m.correlation_id != Some(correlation_id));
            s.messages.len() != before
        })
    }

    // ============= Streaming =============

    pub fn push_message(&self, message: Message) {
        self.state.send_modify(|s| s.messages.push(message));
    }

    /// Append a user message and open a streamed reply to it.
    ///
    /// Returns `false`, changing nothing, while another reply is still in
    /// flight.
    pub fn begin_streamed_reply(&self, user: Message) -> bool {
        self.state.send_if_modified(|s| {
            if s.streaming {
                return false;
            }
            s.messages.push(user);
            s.streaming = true;
            true
        })
    }

    /// Fold one streamed fragment into the reply in flight.
    ///
    /// Extends the trailing streaming assistant message, or starts a new one.
    /// With no reply in flight the fragment is dropped and `false` returned;
    /// this is what remains of a reply abandoned by a session change.
    pub fn append_fragment(&self, text: &str) -> bool {
        self.state.send_if_modified(|s| {
            if !s.streaming {
                return false;
            }
            if let Some(last) = s.messages.last_mut() {
                if last.streaming && last.role == MessageRole::Assistant {
                    last.content.push_str(text);
                    return true;
                }
            }
            for message in s.messages.iter_mut().filter(|m| m.streaming) {
                message.streaming = false;
            }
            s.messages.push(Message::streaming_assistant(text));
            true
        })
    }

    /// Seal the trailing streaming message with completion metadata and end
    /// the reply.
    ///
    /// Returns `false` when there was nothing to seal: no reply in flight,
    /// or a reply that never produced a fragment.
    pub fn seal_streaming(&self, meta: CompletionMeta) -> bool {
        let mut sealed = false;
        self.state.send_if_modified(|s| {
            if !s.streaming {
                return false;
            }
            if let Some(last) = s.messages.last_mut() {
                if last.streaming {
                    last.seal(meta);
                    sealed = true;
                }
            }
            end_reply(s);
            true
        });
        sealed
    }

    /// Stop streaming, keeping partial content, and optionally record an error.
    pub fn halt_streaming(&self, error: Option<String>) {
        self.state.send_modify(|s| {
            end_reply(s);
            if error.is_some() {
                s.error = error;
            }
        });
    }

    // ============= Flags =============

    pub fn set_connected(&self, connected: bool) {
        self.state.send_if_modified(|s| {
            let changed = s.connected != connected;
            s.connected = connected;
            changed
        });
    }

    pub fn set_error(&self, error: impl Into<String>) {
        let error = error.into();
        self.state.send_modify(|s| s.error = Some(error));
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Empty the conversation. A reply in flight is abandoned.
    pub fn clear_messages(&self) {
        self.state.send_modify(|s| {
            s.messages.clear();
            end_reply(s);
        });
    }

    /// Mark a REST call in flight until the returned guard is dropped.
    pub fn begin_request(&self) -> LoadingGuard {
        self.state.send_modify(|s| {
            s.in_flight += 1;
            s.loading = true;
        });
        LoadingGuard {
            state: Arc::clone(&self.state),
        }
    }
}

/// End the reply in flight, if any, keeping whatever content arrived.
fn end_reply(s: &mut ChatState) {
    s.streaming = false;
    for message in s.messages.iter_mut().filter(|m| m.streaming) {
        message.streaming = false;
    }
}

/// Keeps `loading` set while alive.
///
/// Overlapping calls each hold a guard; `loading` clears when the last
/// one drops.
#[derive(Debug)]
#[must_use = "loading clears as soon as the guard is dropped"]
pub struct LoadingGuard {
    state: Arc<watch::Sender<ChatState>>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            s.loading = s.in_flight > 0;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: SessionId) -> Session {
        Session::acknowledged(id, "general", None)
    }

    fn meta(id: i64) -> CompletionMeta {
        CompletionMeta {
            message_id: id,
            ..CompletionMeta::default()
        }
    }

    #[test]
    fn test_begin_session_clears_messages_and_lists_first() {
        let store = SessionStore::new();
        store.set_sessions(vec![session(1), session(2)]);
        store.push_message(Message::confirmed_user("old"));

        store.begin_session(session(3));

        let state = store.snapshot();
        assert_eq!(state.current_session_id(), Some(3));
        assert!(state.messages.is_empty());
        let ids: Vec<_> = state.sessions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_adopt_session_only_when_none_current() {
        let store = SessionStore::new();
        assert!(store.adopt_session(session(5)));
        assert!(!store.adopt_session(session(6)));
        assert_eq!(store.snapshot().current_session_id(), Some(5));
    }

    #[test]
    fn test_remove_current_session_clears_conversation() {
        let store = SessionStore::new();
        store.begin_session(session(1));
        store.push_message(Message::confirmed_user("hi"));

        assert!(store.remove_session(1));
        let state = store.snapshot();
        assert!(state.current_session.is_none());
        assert!(state.messages.is_empty());
        assert!(state.sessions.is_empty());
    }

    #[test]
    fn test_remove_other_session_keeps_conversation() {
        let store = SessionStore::new();
        store.set_sessions(vec![session(2)]);
        store.begin_session(session(1));
        store.push_message(Message::confirmed_user("hi"));

        assert!(!store.remove_session(2));
        let state = store.snapshot();
        assert_eq!(state.current_session_id(), Some(1));
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.sessions.len(), 1);
    }

    #[test]
    fn test_commit_staged_replaces_in_place_and_appends_reply() {
        let store = SessionStore::new();
        let id = store.stage_user_message("Hello");

        let mut reply = Message::confirmed_user("Hi");
        reply.role = MessageRole::Assistant;
        reply.id = 7;
        assert!(store.commit_staged(id, None, reply));

        let messages = store.snapshot().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hello");
        assert!(!messages[0].pending);
        assert!(messages[0].correlation_id.is_none());
        assert_eq!(messages[1].id, 7);
    }

    #[test]
    fn test_commit_staged_uses_server_echo() {
        let store = SessionStore::new();
        let id = store.stage_user_message("Hello");

        let mut echo = Message::confirmed_user("Hello");
        echo.id = 10;
        let mut reply = Message::confirmed_user("Hi");
        reply.role = MessageRole::Assistant;
        reply.id = 11;
        assert!(store.commit_staged(id, Some(echo), reply));

        let ids: Vec<_> = store.snapshot().messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn test_commit_after_clear_is_dropped() {
        let store = SessionStore::new();
        let id = store.stage_user_message("Hello");
        store.clear_messages();

        assert!(!store.commit_staged(id, None, Message::confirmed_user("x")));
        assert!(store.snapshot().messages.is_empty());
    }

    #[test]
    fn test_rollback_removes_only_staged_entry() {
        let store = SessionStore::new();
        store.push_message(Message::confirmed_user("earlier"));
        let before = store.snapshot().messages;

        let id = store.stage_user_message("Hello");
        assert!(store.rollback_staged(id));
        assert_eq!(store.snapshot().messages, before);
        assert!(!store.rollback_staged(id));
    }

    fn streaming_store() -> SessionStore {
        let store = SessionStore::new();
        store.begin_session(session(1));
        assert!(store.begin_streamed_reply(Message::confirmed_user("Symptoms?")));
        store
    }

    #[test]
    fn test_fragments_extend_one_streaming_message() {
        let store = streaming_store();
        assert!(store.append_fragment("Fever"));
        assert!(store.append_fragment(" and cough"));

        let state = store.snapshot();
        assert!(state.streaming);
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].content, "Fever and cough");
        assert_eq!(state.streaming_count(), 1);
    }

    #[test]
    fn test_second_reply_refused_while_one_is_in_flight() {
        let store = streaming_store();
        store.append_fragment("Fever");
        let before = store.snapshot();

        assert!(!store.begin_streamed_reply(Message::confirmed_user("Rash?")));
        assert_eq!(store.snapshot(), before);
        assert!(store.snapshot().messages.last().unwrap().streaming);
    }

    #[test]
    fn test_fragment_without_reply_in_flight_is_dropped() {
        let store = SessionStore::new();
        store.push_message(Message::confirmed_user("hi"));
        let before = store.snapshot();

        assert!(!store.append_fragment("stray"));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_session_change_abandons_reply() {
        let store = streaming_store();
        store.append_fragment("reply to one ");

        store.begin_session(session(2));
        let state = store.snapshot();
        assert!(!state.streaming);
        assert!(state.messages.is_empty());

        assert!(!store.append_fragment("tail"));
        assert!(!store.seal_streaming(meta(99)));
        let state = store.snapshot();
        assert_eq!(state.current_session_id(), Some(2));
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_load_and_delete_abandon_reply() {
        let store = streaming_store();
        store.append_fragment("partial");
        store.replace_conversation(session(4), vec![Message::confirmed_user("older")]);
        assert!(!store.snapshot().streaming);
        assert!(!store.append_fragment("tail"));
        assert_eq!(store.snapshot().messages.len(), 1);

        assert!(store.begin_streamed_reply(Message::confirmed_user("again")));
        store.append_fragment("partial");
        assert!(store.remove_session(4));
        assert!(!store.snapshot().streaming);
        assert!(!store.append_fragment("tail"));
        assert!(store.snapshot().messages.is_empty());
    }

    #[test]
    fn test_clear_messages_abandons_reply() {
        let store = streaming_store();
        store.append_fragment("partial");
        store.clear_messages();

        assert!(!store.append_fragment("tail"));
        let state = store.snapshot();
        assert!(!state.streaming);
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_seal_streaming_stamps_metadata() {
        let store = streaming_store();
        store.append_fragment("done");

        assert!(store.seal_streaming(meta(42)));
        let state = store.snapshot();
        assert!(!state.streaming);
        let last = state.messages.last().unwrap();
        assert_eq!(last.id, 42);
        assert!(!last.streaming);
        assert_eq!(last.was_cached, Some(false));
    }

    #[test]
    fn test_seal_without_fragments_ends_reply_and_leaves_messages() {
        let store = streaming_store();
        let before = store.snapshot().messages;

        assert!(!store.seal_streaming(meta(1)));
        let state = store.snapshot();
        assert!(!state.streaming);
        assert_eq!(state.messages, before);
    }

    #[test]
    fn test_halt_streaming_keeps_partial_content() {
        let store = streaming_store();
        store.append_fragment("partial");
        store.halt_streaming(Some("boom".to_string()));

        let state = store.snapshot();
        assert!(!state.streaming);
        assert_eq!(state.streaming_count(), 0);
        assert_eq!(state.messages[1].content, "partial");
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(store.begin_streamed_reply(Message::confirmed_user("retry")));
    }

    #[test]
    fn test_loading_guard_tracks_overlapping_requests() {
        let store = SessionStore::new();
        let first = store.begin_request();
        let second = store.begin_request();
        assert!(store.snapshot().loading);

        drop(first);
        assert!(store.snapshot().loading);
        drop(second);
        assert!(!store.snapshot().loading);
    }

    #[test]
    fn test_subscribers_see_updates() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        store.set_error("oops");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().error.as_deref(), Some("oops"));

        store.set_connected(false);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_clear_error() {
        let store = SessionStore::new();
        store.set_error("oops");
        store.clear_error();
        assert!(store.snapshot().error.is_none());
    }
}
