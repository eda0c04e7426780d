//! Mock streaming channel for testing.
//!
//! Provides a channel factory whose channels are driven by the test:
//! frames are injected, closes and errors simulated, and everything the
//! client sends is captured.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

use crate::traits::{ChannelEvent, ChannelFactory, ChannelHandle, StreamChannel, WsError};
use crate::websocket::messages::{WsIncomingMessage, WsOutgoingMessage};

#[derive(Debug, Default)]
struct MockChannelState {
    /// URLs of every connect attempt, successful or not
    connect_urls: Vec<String>,
    fail_connect: bool,
    send_should_fail: bool,
    /// Event sender of the most recently opened channel
    current: Option<mpsc::Sender<ChannelEvent>>,
    sent: Vec<String>,
    closes: Vec<(u16, String)>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock channel factory for testing.
///
/// Clones share state, so a test keeps one handle while the supervisor
/// owns another.
///
/// # Example
///
/// ```
/// use clinic_chat::adapters::mock::MockChannelFactory;
/// use clinic_chat::traits::ChannelFactory;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let factory = MockChannelFactory::new();
/// let handle = factory.connect("ws://test/ws?token=t").await.unwrap();
/// handle.channel.send_text("{\"type\":\"ping\"}".to_string()).await.unwrap();
///
/// assert_eq!(factory.connect_count(), 1);
/// assert_eq!(factory.sent_frames().len(), 1);
/// assert!(factory.inject_text(r#"{"type":"pong"}"#));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockChannelFactory {
    state: Arc<Mutex<MockChannelState>>,
}

impl MockChannelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connect attempts so far.
    pub fn connect_count(&self) -> usize {
        lock(&self.state).connect_urls.len()
    }

    /// URLs of all connect attempts.
    pub fn connect_urls(&self) -> Vec<String> {
        lock(&self.state).connect_urls.clone()
    }

    /// Make subsequent connect attempts fail.
    pub fn set_fail_connect(&self, fail: bool) {
        lock(&self.state).fail_connect = fail;
    }

    /// Make sends on open channels fail.
    pub fn set_send_should_fail(&self, fail: bool) {
        lock(&self.state).send_should_fail = fail;
    }

    /// Whether a channel is currently open.
    pub fn is_open(&self) -> bool {
        lock(&self.state)
            .current
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    fn deliver(&self, event: ChannelEvent) -> bool {
        let state = lock(&self.state);
        match &state.current {
            Some(tx) => tx.try_send(event).is_ok(),
            None => false,
        }
    }

    /// Deliver a raw text frame on the open channel.
    ///
    /// Returns `false` if no channel is open.
    pub fn inject_text(&self, text: &str) -> bool {
        self.deliver(ChannelEvent::Text(text.to_string()))
    }

    /// Deliver a typed server frame on the open channel.
    pub fn inject_message(&self, msg: &WsIncomingMessage) -> bool {
        match serde_json::to_string(msg) {
            Ok(text) => self.inject_text(&text),
            Err(_) => false,
        }
    }

    /// Simulate the server closing the channel.
    pub fn simulate_close(&self, code: Option<u16>, reason: &str) -> bool {
        let delivered = self.deliver(ChannelEvent::Closed {
            code,
            reason: Some(reason.to_string()),
        });
        lock(&self.state).current = None;
        delivered
    }

    /// Simulate a transport error on the channel.
    pub fn simulate_error(&self, message: &str) -> bool {
        let delivered = self.deliver(ChannelEvent::Error(message.to_string()));
        lock(&self.state).current = None;
        delivered
    }

    /// Raw frames sent by the client, across all channels.
    pub fn sent_frames(&self) -> Vec<String> {
        lock(&self.state).sent.clone()
    }

    /// Sent frames decoded as outgoing messages.
    pub fn sent_messages(&self) -> Vec<WsOutgoingMessage> {
        self.sent_frames()
            .iter()
            .filter_map(|f| serde_json::from_str(f).ok())
            .collect()
    }

    /// Close codes and reasons the client sent.
    pub fn close_calls(&self) -> Vec<(u16, String)> {
        lock(&self.state).closes.clone()
    }
}

#[async_trait]
impl ChannelFactory for MockChannelFactory {
    async fn connect(&self, url: &str) -> Result<ChannelHandle, WsError> {
        let mut state = lock(&self.state);
        state.connect_urls.push(url.to_string());
        if state.fail_connect {
            return Err(WsError::ConnectionFailed("Mock connect failure".to_string()));
        }

        let (tx, rx) = mpsc::channel(100);
        state.current = Some(tx);

        Ok(ChannelHandle {
            channel: Box::new(MockChannel {
                state: Arc::clone(&self.state),
            }),
            events: rx,
        })
    }
}

struct MockChannel {
    state: Arc<Mutex<MockChannelState>>,
}

#[async_trait]
impl StreamChannel for MockChannel {
    async fn send_text(&self, text: String) -> Result<(), WsError> {
        let mut state = lock(&self.state);
        if state.send_should_fail {
            return Err(WsError::SendFailed("Mock send failure".to_string()));
        }
        if state.current.is_none() {
            return Err(WsError::Disconnected);
        }
        state.sent.push(text);
        Ok(())
    }

    async fn close(&self, code: u16, reason: &str) -> Result<(), WsError> {
        let mut state = lock(&self.state);
        state.closes.push((code, reason.to_string()));
        state.current = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::messages::WsChunk;

    #[tokio::test]
    async fn test_injected_frames_arrive_in_order() {
        let factory = MockChannelFactory::new();
        let mut handle = factory.connect("ws://test").await.unwrap();

        assert!(factory.inject_text("a"));
        assert!(factory.inject_message(&WsIncomingMessage::Chunk(WsChunk {
            text: "b".to_string()
        })));

        assert_eq!(handle.events.recv().await, Some(ChannelEvent::Text("a".to_string())));
        match handle.events.recv().await {
            Some(ChannelEvent::Text(text)) => assert!(text.contains("\"chunk\"")),
            other => panic!("Expected text frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_simulate_close_ends_events() {
        let factory = MockChannelFactory::new();
        let mut handle = factory.connect("ws://test").await.unwrap();

        assert!(factory.simulate_close(Some(1006), "gone"));
        assert_eq!(
            handle.events.recv().await,
            Some(ChannelEvent::Closed {
                code: Some(1006),
                reason: Some("gone".to_string())
            })
        );
        assert_eq!(handle.events.recv().await, None);
        assert!(!factory.is_open());
        assert!(!factory.inject_text("late"));
    }

    #[tokio::test]
    async fn test_fail_connect_still_counts_attempt() {
        let factory = MockChannelFactory::new();
        factory.set_fail_connect(true);

        assert!(factory.connect("ws://test").await.is_err());
        assert_eq!(factory.connect_count(), 1);
        assert!(!factory.is_open());
    }

    #[tokio::test]
    async fn test_close_records_code() {
        let factory = MockChannelFactory::new();
        let handle = factory.connect("ws://test").await.unwrap();

        handle.channel.close(1000, "bye").await.unwrap();
        assert_eq!(factory.close_calls(), vec![(1000, "bye".to_string())]);
        assert!(matches!(
            handle.channel.send_text("x".to_string()).await,
            Err(WsError::Disconnected)
        ));
    }
}
