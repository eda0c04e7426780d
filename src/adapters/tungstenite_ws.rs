//! Tungstenite-based streaming channel adapter.
//!
//! Opens a WebSocket with tokio-tungstenite, splits it, and spawns a reader
//! task that forwards frames as [`ChannelEvent`]s in arrival order.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::traits::{ChannelEvent, ChannelFactory, ChannelHandle, StreamChannel, WsError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = Arc<Mutex<SplitSink<WsStream, Message>>>;

/// Capacity of the inbound event queue per channel.
const EVENT_BUFFER: usize = 100;

/// Opens real WebSocket channels.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteChannelFactory;

impl TungsteniteChannelFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChannelFactory for TungsteniteChannelFactory {
    async fn connect(&self, url: &str) -> Result<ChannelHandle, WsError> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        info!("Connected to streaming channel");

        let (sink, stream) = ws_stream.split();
        let sink: WsSink = Arc::new(Mutex::new(sink));
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

        tokio::spawn(run_reader(stream, Arc::clone(&sink), events_tx));

        Ok(ChannelHandle {
            channel: Box::new(TungsteniteChannel { sink }),
            events: events_rx,
        })
    }
}

/// Writer half of an open tungstenite channel.
pub struct TungsteniteChannel {
    sink: WsSink,
}

#[async_trait]
impl StreamChannel for TungsteniteChannel {
    async fn send_text(&self, text: String) -> Result<(), WsError> {
        self.sink
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }

    async fn close(&self, code: u16, reason: &str) -> Result<(), WsError> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        self.sink
            .lock()
            .await
            .send(Message::Close(Some(frame)))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }
}

/// Forward inbound frames until the socket closes or the receiver is dropped.
async fn run_reader(
    mut stream: SplitStream<WsStream>,
    sink: WsSink,
    events_tx: mpsc::Sender<ChannelEvent>,
) {
    while let Some(msg) = stream.next().await {
        let event = match msg {
            Ok(Message::Text(text)) => ChannelEvent::Text(text),
            Ok(Message::Close(frame)) => {
                let (code, reason) = match frame {
                    Some(frame) => (Some(u16::from(frame.code)), Some(frame.reason.into_owned())),
                    None => (None, None),
                };
                info!("Received close frame from server (code {:?})", code);
                let _ = events_tx.send(ChannelEvent::Closed { code, reason }).await;
                return;
            }
            Ok(Message::Ping(data)) => {
                debug!("Received ping, sending pong");
                let _ = sink.lock().await.send(Message::Pong(data)).await;
                continue;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("Streaming channel error: {}", e);
                let _ = events_tx.send(ChannelEvent::Error(e.to_string())).await;
                return;
            }
        };

        if events_tx.send(event).await.is_err() {
            debug!("Channel receiver dropped, stopping reader");
            return;
        }
    }

    debug!("Streaming channel ended");
}
