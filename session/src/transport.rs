//! Socket seam. `WsTransport` talks to a real server, `MemoryTransport` is an in-process fake.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    time::Instant,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        protocol::{frame::coding::CloseCode, CloseFrame},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};

use crate::error::SessionError;

pub const NORMAL_CLOSE: u16 = 1000;
/// Close frame arrived without a status code.
pub const NO_STATUS_CLOSE: u16 = 1005;
/// Link ended without any close frame.
pub const ABNORMAL_CLOSE: u16 = 1006;

const CLOSE_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Close { code: u16, reason: String },
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, url: &str) -> Result<Box<dyn TransportStream>, SessionError>;
}

#[async_trait]
pub trait TransportStream: Send {
    async fn send_text(&mut self, text: String) -> Result<(), SessionError>;

    /// Next frame from the peer. `None` means the link dropped without a close frame.
    async fn next_frame(&mut self) -> Option<Result<Frame, SessionError>>;

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), SessionError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

struct WsStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn TransportStream>, SessionError> {
        let (socket, response) = connect_async(url)
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;
        tracing::debug!("Handshake with {} returned {}", url, response.status());
        Ok(Box::new(WsStream { socket }))
    }
}

#[async_trait]
impl TransportStream for WsStream {
    async fn send_text(&mut self, text: String) -> Result<(), SessionError> {
        self.socket
            .send(Message::Text(text))
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))
    }

    async fn next_frame(&mut self) -> Option<Result<Frame, SessionError>> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text))),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = match frame {
                        Some(frame) => (u16::from(frame.code), frame.reason.into_owned()),
                        None => (NO_STATUS_CLOSE, String::new()),
                    };
                    return Some(Ok(Frame::Close { code, reason }));
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!("Ignoring binary frame");
                }
                Ok(_) => {}
                Err(e) => return Some(Err(SessionError::Transport(e.to_string()))),
            }
        }
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), SessionError> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        self.socket
            .close(Some(frame))
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        // Wait for the server's close acknowledgement.
        let drain = async { while let Some(Ok(_)) = self.socket.next().await {} };
        if tokio::time::timeout(CLOSE_DRAIN_TIMEOUT, drain).await.is_err() {
            tracing::debug!("Server did not acknowledge close in time");
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum OpenBehavior {
    Accept,
    Refuse(String),
    Hang,
}

enum ServerEvent {
    Frame(Frame),
    Drop,
}

#[derive(Default)]
struct MemoryState {
    plan: VecDeque<OpenBehavior>,
    attempts: Vec<(Instant, String)>,
    sent: Vec<String>,
    client_closes: Vec<u16>,
    server: Option<UnboundedSender<ServerEvent>>,
}

/// Scriptable transport for driving a session without a network.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

struct MemoryStream {
    state: Arc<Mutex<MemoryState>>,
    incoming: UnboundedReceiver<ServerEvent>,
    closed: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The next open attempt fails with `reason`.
    pub fn refuse_next(&self, reason: &str) {
        self.lock().plan.push_back(OpenBehavior::Refuse(reason.to_string()));
    }

    /// The next open attempt never completes.
    pub fn hang_next(&self) {
        self.lock().plan.push_back(OpenBehavior::Hang);
    }

    pub fn attempts(&self) -> usize {
        self.lock().attempts.len()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.lock().attempts.iter().map(|(at, _)| *at).collect()
    }

    pub fn attempted_urls(&self) -> Vec<String> {
        self.lock().attempts.iter().map(|(_, url)| url.clone()).collect()
    }

    pub fn sent(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Sent frames decoded as JSON. Frames that are not JSON are skipped.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.lock()
            .sent
            .iter()
            .filter_map(|text| serde_json::from_str(text).ok())
            .collect()
    }

    /// Close codes the client has sent, oldest first.
    pub fn client_closes(&self) -> Vec<u16> {
        self.lock().client_closes.clone()
    }

    /// Delivers a text frame on the most recent connection.
    pub fn push_text(&self, text: &str) -> bool {
        self.push(ServerEvent::Frame(Frame::Text(text.to_string())))
    }

    pub fn push_json(&self, value: &serde_json::Value) -> bool {
        self.push_text(&value.to_string())
    }

    pub fn close_from_server(&self, code: u16, reason: &str) -> bool {
        self.push(ServerEvent::Frame(Frame::Close {
            code,
            reason: reason.to_string(),
        }))
    }

    /// Ends the current connection without a close frame.
    pub fn drop_connection(&self) -> bool {
        self.push(ServerEvent::Drop)
    }

    fn push(&self, event: ServerEvent) -> bool {
        match &self.lock().server {
            Some(server) => server.send(event).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn TransportStream>, SessionError> {
        let behavior = {
            let mut state = self.lock();
            state.attempts.push((Instant::now(), url.to_string()));
            state.plan.pop_front().unwrap_or(OpenBehavior::Accept)
        };
        match behavior {
            OpenBehavior::Accept => {
                let (tx, rx) = unbounded_channel();
                self.lock().server = Some(tx);
                Ok(Box::new(MemoryStream {
                    state: Arc::clone(&self.state),
                    incoming: rx,
                    closed: false,
                }))
            }
            OpenBehavior::Refuse(reason) => Err(SessionError::Connect(reason)),
            OpenBehavior::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl TransportStream for MemoryStream {
    async fn send_text(&mut self, text: String) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Transport("stream closed".to_string()));
        }
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sent
            .push(text);
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<Result<Frame, SessionError>> {
        match self.incoming.recv().await? {
            ServerEvent::Frame(frame) => Some(Ok(frame)),
            ServerEvent::Drop => None,
        }
    }

    async fn close(&mut self, code: u16, _reason: &str) -> Result<(), SessionError> {
        self.closed = true;
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .client_closes
            .push(code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_transport_scripted_opens() {
        let transport = MemoryTransport::new();
        transport.refuse_next("connection refused");

        let err = transport.open("ws://test/ws").await.err().unwrap();
        assert!(matches!(err, SessionError::Connect(reason) if reason == "connection refused"));

        let mut stream = transport.open("ws://test/ws").await.unwrap();
        assert_eq!(transport.attempts(), 2);

        stream.send_text("{\"type\":\"get_game_state\"}".to_string()).await.unwrap();
        assert_eq!(transport.sent_json()[0]["type"], "get_game_state");

        assert!(transport.push_text("hello"));
        assert_eq!(
            stream.next_frame().await.unwrap().unwrap(),
            Frame::Text("hello".to_string())
        );

        assert!(transport.drop_connection());
        assert!(stream.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_memory_stream_rejects_sends_after_close() {
        let transport = MemoryTransport::new();
        let mut stream = transport.open("ws://test/ws").await.unwrap();
        stream.close(NORMAL_CLOSE, "bye").await.unwrap();
        assert_eq!(transport.client_closes(), vec![NORMAL_CLOSE]);
        assert!(stream.send_text("late".to_string()).await.is_err());
    }
}
