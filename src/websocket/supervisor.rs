//! Lifecycle of the streaming channel.
//!
//! The supervisor runs one background task per controller. It connects,
//! feeds inbound frames to the [`StreamAssembler`], pings while connected,
//! and reconnects after a fixed delay until told to disconnect.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::ChatConfig;
use crate::error::StreamError;
use crate::state::SessionStore;
use crate::stream::StreamAssembler;
use crate::traits::{ChannelEvent, ChannelFactory, ChannelHandle, CredentialsProvider, WsError};
use crate::websocket::messages::WsOutgoingMessage;

/// Reason sent with a client-initiated close.
const DISCONNECT_REASON: &str = "client disconnect";

/// Connection state of the streaming channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsConnectionState {
    /// Not started yet
    Disconnected,
    /// Opening the channel
    Connecting { attempt: u32 },
    Connected,
    /// No credential yet; the connect is retried after a delay
    AwaitingCredentials,
    /// Lost the channel or failed to open it; waiting before `attempt`
    Reconnecting { attempt: u32 },
    /// Deliberately disconnected; no further attempts
    Closed,
}

impl WsConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, WsConnectionState::Connected)
    }
}

enum SupervisorCommand {
    Send(WsOutgoingMessage, oneshot::Sender<Result<(), WsError>>),
    Disconnect,
}

/// Timing and addressing of the supervised channel.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub ws_url: String,
    pub reconnect_delay: Duration,
    pub auth_retry_delay: Duration,
    pub ping_interval: Duration,
    pub deliberate_close_code: u16,
}

impl From<&ChatConfig> for SupervisorSettings {
    fn from(config: &ChatConfig) -> Self {
        Self {
            ws_url: config.ws_url.clone(),
            reconnect_delay: config.reconnect_delay,
            auth_retry_delay: config.auth_retry_delay,
            ping_interval: config.ping_interval,
            deliberate_close_code: config.deliberate_close_code,
        }
    }
}

/// Handle to a running supervisor task.
///
/// Dropping the handle disconnects deliberately.
#[derive(Debug)]
pub struct ConnectionSupervisor {
    commands: mpsc::UnboundedSender<SupervisorCommand>,
    state_rx: watch::Receiver<WsConnectionState>,
}

impl ConnectionSupervisor {
    /// Spawn the supervisor task and start the first connect attempt.
    pub fn spawn(
        factory: Arc<dyn ChannelFactory>,
        credentials: Arc<dyn CredentialsProvider>,
        assembler: StreamAssembler,
        store: SessionStore,
        settings: SupervisorSettings,
    ) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(WsConnectionState::Disconnected);

        let task = SupervisorTask {
            factory,
            credentials,
            assembler,
            store,
            settings,
            commands: commands_rx,
            state_tx,
        };
        tokio::spawn(task.run());

        Self { commands, state_rx }
    }

    pub fn state(&self) -> WsConnectionState {
        self.state_rx.borrow().clone()
    }

    /// Receiver notified on every state transition.
    pub fn state_receiver(&self) -> watch::Receiver<WsConnectionState> {
        self.state_rx.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state_rx.borrow().is_connected()
    }

    /// Send a frame on the open channel.
    ///
    /// Fails with [`WsError::Disconnected`] if the channel is not open.
    pub async fn send(&self, msg: WsOutgoingMessage) -> Result<(), WsError> {
        if !self.is_connected() {
            return Err(WsError::Disconnected);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(SupervisorCommand::Send(msg, reply_tx))
            .map_err(|_| WsError::Disconnected)?;
        reply_rx.await.map_err(|_| WsError::Disconnected)?
    }

    /// Close the channel with the deliberate code and cancel any pending retry.
    pub fn disconnect(&self) {
        let _ = self.commands.send(SupervisorCommand::Disconnect);
    }

    /// Wait until the supervisor has shut down.
    pub async fn closed(&self) {
        let mut state_rx = self.state_rx.clone();
        let _ = state_rx
            .wait_for(|state| *state == WsConnectionState::Closed)
            .await;
    }
}

/// How a connected session ended.
enum ChannelOutcome {
    /// Closed on purpose, by us or by the server with the deliberate code
    Deliberate,
    Lost(StreamError),
}

struct SupervisorTask {
    factory: Arc<dyn ChannelFactory>,
    credentials: Arc<dyn CredentialsProvider>,
    assembler: StreamAssembler,
    store: SessionStore,
    settings: SupervisorSettings,
    commands: mpsc::UnboundedReceiver<SupervisorCommand>,
    state_tx: watch::Sender<WsConnectionState>,
}

impl SupervisorTask {
    fn set_state(&self, state: WsConnectionState) {
        debug!("Streaming channel state: {:?}", state);
        self.state_tx.send_replace(state);
    }

    async fn run(mut self) {
        let mut attempt: u32 = 0;

        loop {
            let Some(token) = self.credentials.access_token().await else {
                info!(
                    "No credential available, deferring connect for {:?}",
                    self.settings.auth_retry_delay
                );
                self.set_state(WsConnectionState::AwaitingCredentials);
                if !self.wait(self.settings.auth_retry_delay).await {
                    break;
                }
                continue;
            };

            attempt += 1;
            self.set_state(WsConnectionState::Connecting { attempt });

            let url = channel_url(&self.settings.ws_url, &token);
            match self.factory.connect(&url).await {
                Ok(handle) => {
                    info!("Streaming channel connected");
                    attempt = 0;
                    self.store.set_connected(true);
                    self.set_state(WsConnectionState::Connected);

                    let outcome = self.run_connected(handle).await;
                    self.store.set_connected(false);

                    match outcome {
                        ChannelOutcome::Deliberate => {
                            self.halt_stream(None);
                            break;
                        }
                        ChannelOutcome::Lost(err) => {
                            warn!("Streaming channel lost: {}", err);
                            self.halt_stream(Some(err));
                        }
                    }
                }
                Err(e) => {
                    warn!("Streaming channel connect attempt {} failed: {}", attempt, e);
                }
            }

            self.set_state(WsConnectionState::Reconnecting {
                attempt: attempt + 1,
            });
            if !self.wait(self.settings.reconnect_delay).await {
                break;
            }
        }

        self.store.set_connected(false);
        self.set_state(WsConnectionState::Closed);
        info!("Streaming channel supervisor stopped");
    }

    /// Stop an in-flight reply, keeping its partial content.
    fn halt_stream(&self, err: Option<StreamError>) {
        if self.store.read(|s| s.streaming || s.streaming_count() > 0) {
            self.store.halt_streaming(err.map(|e| e.user_message()));
        }
    }

    /// Sleep for `delay` while serving commands.
    ///
    /// Returns `false` if a disconnect arrived first.
    async fn wait(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                cmd = self.commands.recv() => match cmd {
                    Some(SupervisorCommand::Send(_, reply)) => {
                        let _ = reply.send(Err(WsError::Disconnected));
                    }
                    Some(SupervisorCommand::Disconnect) | None => {
                        debug!("Disconnect requested, cancelling pending connect");
                        return false;
                    }
                },
            }
        }
    }

    async fn run_connected(&mut self, handle: ChannelHandle) -> ChannelOutcome {
        let ChannelHandle {
            channel,
            mut events,
        } = handle;

        let period = self.settings.ping_interval;
        let mut ping = tokio::time::interval_at(Instant::now() + period, period);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(ChannelEvent::Text(text)) => self.assembler.apply_frame(&text),
                    Some(ChannelEvent::Closed { code, reason }) => {
                        if code == Some(self.settings.deliberate_close_code) {
                            info!("Server closed the streaming channel normally");
                            return ChannelOutcome::Deliberate;
                        }
                        return ChannelOutcome::Lost(StreamError::ServerClosed { code, reason });
                    }
                    Some(ChannelEvent::Error(message)) => {
                        return ChannelOutcome::Lost(StreamError::ConnectionLost { message });
                    }
                    None => {
                        return ChannelOutcome::Lost(StreamError::ServerClosed {
                            code: None,
                            reason: None,
                        });
                    }
                },
                cmd = self.commands.recv() => match cmd {
                    Some(SupervisorCommand::Send(msg, reply)) => {
                        let result = match msg.to_text() {
                            Ok(text) => channel.send_text(text).await,
                            Err(e) => Err(e),
                        };
                        let _ = reply.send(result);
                    }
                    Some(SupervisorCommand::Disconnect) | None => {
                        info!("Closing streaming channel");
                        if let Err(e) = channel
                            .close(self.settings.deliberate_close_code, DISCONNECT_REASON)
                            .await
                        {
                            debug!("Close frame not sent: {}", e);
                        }
                        return ChannelOutcome::Deliberate;
                    }
                },
                _ = ping.tick() => {
                    let sent = match WsOutgoingMessage::Ping.to_text() {
                        Ok(text) => channel.send_text(text).await,
                        Err(e) => Err(e),
                    };
                    if let Err(e) = sent {
                        warn!("Failed to send ping: {}", e);
                    }
                }
            }
        }
    }
}

/// Append the credential as the `token` query parameter.
fn channel_url(ws_url: &str, token: &str) -> String {
    let separator = if ws_url.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", ws_url, separator, urlencoding::encode(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemoryCredentials, MockChannelFactory};
    use crate::auth::Credentials;
    use crate::models::Message;

    struct Harness {
        factory: MockChannelFactory,
        credentials: InMemoryCredentials,
        store: SessionStore,
        supervisor: ConnectionSupervisor,
    }

    fn start(credentials: InMemoryCredentials) -> Harness {
        let factory = MockChannelFactory::new();
        let store = SessionStore::new();
        let config = ChatConfig::default().with_ws_url("ws://clinic.test/ws/ai/chat");
        let supervisor = ConnectionSupervisor::spawn(
            Arc::new(factory.clone()),
            Arc::new(credentials.clone()),
            StreamAssembler::new(store.clone(), "general", None),
            store.clone(),
            SupervisorSettings::from(&config),
        );
        Harness {
            factory,
            credentials,
            store,
            supervisor,
        }
    }

    async fn wait_for_state(supervisor: &ConnectionSupervisor, expected: WsConnectionState) {
        let mut rx = supervisor.state_receiver();
        rx.wait_for(|s| *s == expected).await.unwrap();
    }

    /// Let spawned tasks run without advancing the paused clock.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_channel_url_encodes_token() {
        assert_eq!(
            channel_url("ws://h/ws/ai/chat", "a b"),
            "ws://h/ws/ai/chat?token=a%20b"
        );
        assert_eq!(channel_url("ws://h/ws?x=1", "t"), "ws://h/ws?x=1&token=t");
    }

    #[tokio::test(start_paused = true)]
    async fn test_connects_with_token_in_url() {
        let h = start(InMemoryCredentials::with_token("tok"));
        wait_for_state(&h.supervisor, WsConnectionState::Connected).await;

        assert!(h.store.snapshot().connected);
        assert_eq!(
            h.factory.connect_urls(),
            vec!["ws://clinic.test/ws/ai/chat?token=tok".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_unexpected_close() {
        let h = start(InMemoryCredentials::with_token("tok"));
        wait_for_state(&h.supervisor, WsConnectionState::Connected).await;

        assert!(h.factory.simulate_close(Some(1006), "abnormal"));
        wait_for_state(&h.supervisor, WsConnectionState::Reconnecting { attempt: 1 }).await;
        assert!(!h.store.snapshot().connected);
        assert_eq!(h.factory.connect_count(), 1);

        tokio::time::sleep(Duration::from_millis(2900)).await;
        settle().await;
        assert_eq!(h.factory.connect_count(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        wait_for_state(&h.supervisor, WsConnectionState::Connected).await;
        assert_eq!(h.factory.connect_count(), 2);
        assert!(h.store.snapshot().connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_retry() {
        let h = start(InMemoryCredentials::with_token("tok"));
        wait_for_state(&h.supervisor, WsConnectionState::Connected).await;

        h.factory.simulate_error("reset by peer");
        wait_for_state(&h.supervisor, WsConnectionState::Reconnecting { attempt: 1 }).await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        h.supervisor.disconnect();
        h.supervisor.closed().await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(h.factory.connect_count(), 1);
        assert!(!h.store.snapshot().connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliberate_disconnect_sends_close_code() {
        let h = start(InMemoryCredentials::with_token("tok"));
        wait_for_state(&h.supervisor, WsConnectionState::Connected).await;

        h.supervisor.disconnect();
        h.supervisor.closed().await;

        assert_eq!(
            h.factory.close_calls(),
            vec![(1000, DISCONNECT_REASON.to_string())]
        );
        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(h.factory.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_close_with_deliberate_code_does_not_reconnect() {
        let h = start(InMemoryCredentials::with_token("tok"));
        wait_for_state(&h.supervisor, WsConnectionState::Connected).await;

        h.factory.simulate_close(Some(1000), "shutdown");
        h.supervisor.closed().await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(h.factory.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_deferred_until_credentials_exist() {
        let h = start(InMemoryCredentials::new());
        wait_for_state(&h.supervisor, WsConnectionState::AwaitingCredentials).await;
        assert_eq!(h.factory.connect_count(), 0);

        h.credentials
            .set_credentials(Some(Credentials::with_token("late")));

        tokio::time::sleep(Duration::from_millis(4900)).await;
        settle().await;
        assert_eq!(h.factory.connect_count(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        wait_for_state(&h.supervisor, WsConnectionState::Connected).await;
        assert_eq!(h.factory.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_connect_is_retried() {
        let h = start(InMemoryCredentials::with_token("tok"));
        h.factory.set_fail_connect(true);

        wait_for_state(&h.supervisor, WsConnectionState::Reconnecting { attempt: 2 }).await;
        h.factory.set_fail_connect(false);

        tokio::time::sleep(Duration::from_millis(3100)).await;
        wait_for_state(&h.supervisor, WsConnectionState::Connected).await;
        assert_eq!(h.factory.connect_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pings_every_interval_while_connected() {
        let h = start(InMemoryCredentials::with_token("tok"));
        wait_for_state(&h.supervisor, WsConnectionState::Connected).await;
        assert!(h.factory.sent_frames().is_empty());

        tokio::time::sleep(Duration::from_millis(29_900)).await;
        settle().await;
        assert!(h.factory.sent_frames().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(h.factory.sent_messages(), vec![WsOutgoingMessage::Ping]);

        tokio::time::sleep(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(h.factory.sent_messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_requires_connection() {
        let h = start(InMemoryCredentials::new());
        wait_for_state(&h.supervisor, WsConnectionState::AwaitingCredentials).await;

        let result = h.supervisor.send(WsOutgoingMessage::Ping).await;
        assert!(matches!(result, Err(WsError::Disconnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_reach_the_store() {
        let h = start(InMemoryCredentials::with_token("tok"));
        wait_for_state(&h.supervisor, WsConnectionState::Connected).await;

        assert!(h.store.begin_streamed_reply(Message::confirmed_user("Hi")));
        h.factory.inject_text(r#"{"type":"chunk","text":"Hello"}"#);
        let mut rx = h.store.subscribe();
        rx.wait_for(|s| s.messages.len() == 2).await.unwrap();

        assert_eq!(h.store.snapshot().messages[1].content, "Hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_while_streaming_halts_reply() {
        let h = start(InMemoryCredentials::with_token("tok"));
        wait_for_state(&h.supervisor, WsConnectionState::Connected).await;

        assert!(h.store.begin_streamed_reply(Message::confirmed_user("Hi")));
        h.factory.inject_text(r#"{"type":"chunk","text":"Partial"}"#);
        let mut rx = h.store.subscribe();
        rx.wait_for(|s| s.streaming_count() == 1).await.unwrap();

        h.factory.simulate_close(Some(1011), "internal error");
        rx.wait_for(|s| !s.streaming).await.unwrap();

        let state = h.store.snapshot();
        assert_eq!(state.messages[1].content, "Partial");
        assert_eq!(state.streaming_count(), 0);
        assert!(state.error.is_some());
    }
}
