//! Public facade of the chat subsystem.
//!
//! [`ChatController`] is the single entry point for a chat surface. It owns
//! the [`SessionStore`], routes sends through REST or the streaming channel
//! depending on [`TransportMode`], and keeps session listing, loading,
//! deletion and feedback on REST in both modes.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::adapters::{FileCredentialsProvider, ReqwestHttpClient, TungsteniteChannelFactory};
use crate::chat_api::ChatApi;
use crate::config::{ChatConfig, TransportMode};
use crate::error::{ChatError, ChatResult, ErrorContext, NetworkError, StreamError};
use crate::models::{
    CreateSessionRequest, FeedbackRequest, FeedbackType, Message, MessageId, SendMessageRequest,
    Session, SessionId,
};
use crate::state::{ChatState, RequestKind, RequestToken, RequestTracker, SessionStore};
use crate::stream::StreamAssembler;
use crate::traits::{ChannelFactory, CredentialsError, CredentialsProvider, HttpClient};
use crate::websocket::{
    ConnectionSupervisor, SupervisorSettings, WsChatMessage, WsConnectionState, WsOutgoingMessage,
};

/// Conversational client controller.
///
/// Several controllers can coexist; each owns its own store and, in
/// streaming mode, its own channel.
pub struct ChatController {
    config: ChatConfig,
    api: ChatApi,
    store: SessionStore,
    requests: RequestTracker,
    channels: Arc<dyn ChannelFactory>,
    credentials: Arc<dyn CredentialsProvider>,
    supervisor: Option<ConnectionSupervisor>,
}

impl std::fmt::Debug for ChatController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatController")
            .field("transport", &self.config.transport)
            .field("api", &self.api)
            .field("supervisor", &self.supervisor)
            .finish_non_exhaustive()
    }
}

impl ChatController {
    pub fn new(
        config: ChatConfig,
        http: Arc<dyn HttpClient>,
        channels: Arc<dyn ChannelFactory>,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Self {
        let api = ChatApi::new(http, Arc::clone(&credentials), config.api_base_url.clone());
        Self {
            config,
            api,
            store: SessionStore::new(),
            requests: RequestTracker::new(),
            channels,
            credentials,
            supervisor: None,
        }
    }

    /// Controller wired to reqwest, tokio-tungstenite and the credentials file.
    pub fn from_config(config: ChatConfig) -> Result<Self, CredentialsError> {
        let credentials = FileCredentialsProvider::new()?;
        Ok(Self::new(
            config,
            Arc::new(ReqwestHttpClient::new()),
            Arc::new(TungsteniteChannelFactory::new()),
            Arc::new(credentials),
        ))
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn transport(&self) -> TransportMode {
        self.config.transport
    }

    // ============= Lifecycle =============

    /// Start the streaming channel when the streaming transport is selected.
    ///
    /// Does nothing in REST mode or if a channel is already supervised.
    /// Must be called from within a tokio runtime.
    pub fn activate(&mut self) {
        if self.config.transport != TransportMode::Streaming {
            return;
        }
        if self
            .supervisor
            .as_ref()
            .is_some_and(|s| s.state() != WsConnectionState::Closed)
        {
            return;
        }

        info!("Starting streaming channel to {}", self.config.ws_url);
        let assembler = StreamAssembler::new(
            self.store.clone(),
            self.config.context_type.clone(),
            self.config.specialty.clone(),
        );
        self.supervisor = Some(ConnectionSupervisor::spawn(
            Arc::clone(&self.channels),
            Arc::clone(&self.credentials),
            assembler,
            self.store.clone(),
            SupervisorSettings::from(&self.config),
        ));
    }

    /// Deliberately close the streaming channel and cancel any pending retry.
    pub fn disconnect(&self) {
        if let Some(supervisor) = &self.supervisor {
            supervisor.disconnect();
        }
    }

    /// Wait until a requested disconnect has completed.
    pub async fn closed(&self) {
        if let Some(supervisor) = &self.supervisor {
            supervisor.closed().await;
        }
    }

    pub fn connection_state(&self) -> WsConnectionState {
        self.supervisor
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(WsConnectionState::Disconnected)
    }

    /// Receiver for connection transitions; `None` before activation.
    pub fn connection_state_receiver(&self) -> Option<watch::Receiver<WsConnectionState>> {
        self.supervisor.as_ref().map(|s| s.state_receiver())
    }

    // ============= Observable state =============

    /// Snapshot of the whole chat state.
    pub fn state(&self) -> ChatState {
        self.store.snapshot()
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.store.subscribe()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.store.read(|s| s.sessions.clone())
    }

    pub fn current_session(&self) -> Option<Session> {
        self.store.read(|s| s.current_session.clone())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.store.read(|s| s.messages.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.store.read(|s| s.loading)
    }

    pub fn is_streaming(&self) -> bool {
        self.store.read(|s| s.streaming)
    }

    pub fn error(&self) -> Option<String> {
        self.store.read(|s| s.error.clone())
    }

    pub fn is_connected(&self) -> bool {
        self.store.read(|s| s.connected)
    }

    // ============= Local resets =============

    pub fn clear_error(&self) {
        self.store.clear_error();
    }

    pub fn clear_messages(&self) {
        self.store.clear_messages();
    }

    // ============= Sessions =============

    /// Fetch the most recent sessions and replace the session list.
    pub async fn list_sessions(&self) -> ChatResult<Vec<Session>> {
        let token = self.requests.begin(RequestKind::ListSessions);
        let _loading = self.store.begin_request();

        match self.api.list_sessions(self.config.session_list_limit).await {
            Ok(sessions) => {
                if self.requests.is_current(token) {
                    self.store.set_sessions(sessions.clone());
                } else {
                    debug!("Discarding superseded session list");
                }
                Ok(sessions)
            }
            Err(e) => Err(self.fail(e, ErrorContext::new("list_sessions"), token)),
        }
    }

    /// Create a session and make it current with an empty conversation.
    pub async fn create_session(
        &self,
        context_type: &str,
        specialty: Option<&str>,
    ) -> ChatResult<Session> {
        let token = self.requests.begin(RequestKind::CreateSession);
        let _loading = self.store.begin_request();
        self.store.clear_error();

        let request = CreateSessionRequest {
            context_type: context_type.to_string(),
            specialty: specialty.map(str::to_string),
        };
        match self.api.create_session(&request).await {
            Ok(session) => {
                if self.requests.is_current(token) {
                    info!("Created session {}", session.id);
                    self.store.begin_session(session.clone());
                } else {
                    debug!("Discarding superseded session {}", session.id);
                }
                Ok(session)
            }
            Err(e) => Err(self.fail(e, ErrorContext::new("create_session"), token)),
        }
    }

    /// Load a session and its history, replacing the conversation in one step.
    pub async fn load_session(&self, id: SessionId) -> ChatResult<()> {
        let token = self.requests.begin(RequestKind::LoadSession);
        let _loading = self.store.begin_request();
        self.store.clear_error();

        let loaded = futures::try_join!(self.api.get_session(id), self.api.get_messages(id));
        match loaded {
            Ok((session, messages)) => {
                if self.requests.is_current(token) {
                    debug!("Loaded session {} with {} messages", id, messages.len());
                    self.store.replace_conversation(session, messages);
                } else {
                    debug!("Discarding superseded load of session {}", id);
                }
                Ok(())
            }
            Err(e) => Err(self.fail(
                e,
                ErrorContext::new("load_session").with_session_id(id),
                token,
            )),
        }
    }

    /// Delete a session. Deleting the current session clears the conversation.
    pub async fn delete_session(&self, id: SessionId) -> ChatResult<()> {
        let _loading = self.store.begin_request();
        self.store.clear_error();

        match self.api.delete_session(id).await {
            Ok(()) => {
                if self.store.remove_session(id) {
                    info!("Deleted current session {}", id);
                }
                Ok(())
            }
            Err(e) => Err(self.record(e, ErrorContext::new("delete_session").with_session_id(id))),
        }
    }

    // ============= Messages =============

    /// Send a user message over the configured transport.
    ///
    /// Blank messages are ignored.
    pub async fn send_message(&self, content: &str) -> ChatResult<()> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(());
        }

        match self.config.transport {
            TransportMode::Rest => self.send_rest(content).await,
            TransportMode::Streaming => self.send_streaming(content).await,
        }
    }

    /// Current session id, creating a session first if there is none.
    ///
    /// Fails with [`NetworkError::Superseded`] if a newer `create_session`
    /// replaced the one made here, so the message is never posted to a
    /// session that is not on screen.
    async fn ensure_session(&self) -> ChatResult<SessionId> {
        if let Some(id) = self.store.read(|s| s.current_session_id()) {
            return Ok(id);
        }

        debug!("No current session, creating one before sending");
        let session = self
            .create_session(&self.config.context_type, self.config.specialty.as_deref())
            .await?;
        if self.store.read(|s| s.current_session_id()) != Some(session.id) {
            debug!("Session {} superseded before the message was sent", session.id);
            return Err(NetworkError::Superseded {
                operation: "create_session".to_string(),
            }
            .into());
        }
        Ok(session.id)
    }

    async fn send_rest(&self, content: &str) -> ChatResult<()> {
        let session_id = self.ensure_session().await?;

        let _loading = self.store.begin_request();
        self.store.clear_error();
        let correlation_id = self.store.stage_user_message(content);

        let request = SendMessageRequest {
            content: content.to_string(),
            include_history: self.config.include_history,
        };
        match self.api.send_message(session_id, &request).await {
            Ok(response) => {
                let (confirmed, reply) = response.into_parts();
                self.store.commit_staged(correlation_id, confirmed, reply);
                Ok(())
            }
            Err(e) => {
                self.store.rollback_staged(correlation_id);
                Err(self.record(
                    e,
                    ErrorContext::new("send_message").with_session_id(session_id),
                ))
            }
        }
    }

    async fn send_streaming(&self, content: &str) -> ChatResult<()> {
        let Some(supervisor) = self.supervisor.as_ref().filter(|s| s.is_connected()) else {
            return Err(self.record(StreamError::NotConnected, ErrorContext::new("send_message")));
        };

        if !self
            .store
            .begin_streamed_reply(Message::confirmed_user(content))
        {
            return Err(self.record(StreamError::ReplyInFlight, ErrorContext::new("send_message")));
        }
        self.store.clear_error();

        let session_id = self.store.read(|s| s.current_session_id());
        let msg = WsOutgoingMessage::Message(WsChatMessage {
            session_id,
            content: content.to_string(),
            context_type: self.config.context_type.clone(),
            specialty: self.config.specialty.clone(),
            include_history: self.config.include_history,
        });

        if let Err(e) = supervisor.send(msg).await {
            let err = ChatError::from(e);
            warn!("Streaming send failed: {}", err);
            self.store.halt_streaming(Some(err.user_message()));
            let mut ctx = ErrorContext::new("send_message");
            if let Some(id) = session_id {
                ctx = ctx.with_session_id(id);
            }
            return Err(err.with_context(ctx));
        }
        Ok(())
    }

    /// Rate an assistant message.
    ///
    /// Failures are logged and returned but never recorded as a
    /// conversation error.
    pub async fn send_feedback(
        &self,
        message_id: MessageId,
        feedback_type: FeedbackType,
        comment: Option<&str>,
    ) -> ChatResult<()> {
        let request = FeedbackRequest {
            feedback_type,
            comment: comment.map(str::to_string),
        };
        self.api
            .send_feedback(message_id, &request)
            .await
            .map_err(|e| {
                warn!("Feedback for message {} failed: {}", message_id, e);
                e.with_context(ErrorContext::new("send_feedback"))
            })
    }

    // ============= Errors =============

    /// Surface a failure in the store and attach context.
    fn record(&self, err: impl Into<ChatError>, ctx: ErrorContext) -> ChatError {
        let err = err.into();
        warn!("{} failed: {}", ctx.to_log_string(), err);
        if err.requires_reauth() {
            warn!("Credential rejected by the server; sign in again");
        }
        self.store.set_error(err.user_message());
        err.with_context(ctx)
    }

    /// Like [`record`](Self::record), but only surfaces the failure if the
    /// call has not been superseded.
    fn fail(&self, err: ChatError, ctx: ErrorContext, token: RequestToken) -> ChatError {
        if self.requests.is_current(token) {
            self.record(err, ctx)
        } else {
            debug!("Ignoring failure of superseded {}: {}", ctx.operation, err);
            err.with_context(ctx)
        }
    }
}
