//! Connection lifecycle: connect with timeout, frame dispatch, deliberate and unclean closes,
//! and bounded linear auto-reconnect.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    sync::{
        mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
        Notify,
    },
    task::JoinHandle,
    time::{sleep, timeout},
};

use crate::{
    backoff::ReconnectPolicy,
    config::ClientConfig,
    error::SessionError,
    events::{EventRegistry, SessionEvent},
    protocol::{parse_frame, OutboundMessage},
    transport::{Frame, Transport, TransportStream, ABNORMAL_CLOSE, NORMAL_CLOSE},
};

const CLIENT_CLOSE_REASON: &str = "client disconnect";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
        };
        write!(f, "{label}")
    }
}

enum Command {
    Send(String),
    Close,
}

struct LinkState {
    status: ConnectionStatus,
    outbound: Option<UnboundedSender<Command>>,
    policy: ReconnectPolicy,
    reconnect_task: Option<JoinHandle<()>>,
    /// Bumped whenever the status enters `Connecting`.
    attempt: u64,
    /// Bumped whenever a link is established.
    generation: u64,
    manual_close: bool,
    last_error: Option<String>,
}

struct Inner {
    url: String,
    session_id: String,
    connect_timeout: Duration,
    transport: Arc<dyn Transport>,
    events: EventRegistry,
    cancel: Notify,
    link: Mutex<LinkState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, LinkState> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the socket for one session. Cheap to clone; clones share the same link.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        events: EventRegistry,
    ) -> Result<Self, SessionError> {
        let url = config.websocket_url()?;
        Ok(Self {
            inner: Arc::new(Inner {
                url,
                session_id: config.session_id.clone(),
                connect_timeout: config.connect_timeout(),
                transport,
                events,
                cancel: Notify::new(),
                link: Mutex::new(LinkState {
                    status: ConnectionStatus::Disconnected,
                    outbound: None,
                    policy: ReconnectPolicy::new(
                        config.reconnect_base_delay(),
                        config.max_reconnect_attempts,
                    ),
                    reconnect_task: None,
                    attempt: 0,
                    generation: 0,
                    manual_close: false,
                    last_error: None,
                }),
            }),
        })
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn events(&self) -> &EventRegistry {
        &self.inner.events
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.lock().status
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.lock().policy.attempts()
    }

    /// Opens the link. Returns immediately when already connected or connecting.
    /// A failed manual attempt is reported but never retried automatically.
    pub async fn connect(&self) -> Result<(), SessionError> {
        let attempt = {
            let mut link = self.inner.lock();
            if link.status != ConnectionStatus::Disconnected {
                tracing::debug!("connect() ignored while {}", link.status);
                return Ok(());
            }
            if let Some(task) = link.reconnect_task.take() {
                task.abort();
            }
            link.manual_close = false;
            link.policy.reset();
            link.status = ConnectionStatus::Connecting;
            link.attempt += 1;
            link.attempt
        };
        self.open_link(attempt).await
    }

    /// Closes the link with a normal close code and cancels any pending reconnect.
    /// The handle is released at once, so a following `connect()` opens a fresh link.
    /// `disconnected` is emitted by the close itself, not by this call.
    pub fn disconnect(&self) {
        {
            let mut link = self.inner.lock();
            link.manual_close = true;
            if let Some(task) = link.reconnect_task.take() {
                task.abort();
            }
            if let Some(outbound) = link.outbound.take() {
                let _ = outbound.send(Command::Close);
            }
            link.status = ConnectionStatus::Disconnected;
        }
        self.inner.cancel.notify_waiters();
    }

    /// Disconnects and drops every registered handler.
    pub fn shutdown(&self) {
        self.disconnect();
        self.inner.events.clear();
    }

    /// Queues `message` for sending. Fails with `NotConnected`, sending nothing, unless connected.
    pub fn try_send(&self, message: &OutboundMessage) -> Result<(), SessionError> {
        let text = serde_json::to_string(message)?;
        let link = self.inner.lock();
        let outbound = match (&link.outbound, link.status) {
            (Some(outbound), ConnectionStatus::Connected) => outbound,
            _ => return Err(SessionError::NotConnected),
        };
        tracing::debug!("Sending {}", message.kind());
        outbound
            .send(Command::Send(text))
            .map_err(|_| SessionError::NotConnected)
    }

    /// Fire-and-forget form of [`Self::try_send`]. Failures are logged, never raised.
    pub fn send(&self, message: &OutboundMessage) -> bool {
        match self.try_send(message) {
            Ok(()) => true,
            Err(SessionError::NotConnected) => {
                tracing::warn!("Not connected, dropping {} message", message.kind());
                false
            }
            Err(err) => {
                tracing::error!("Failed to send {}: {}", message.kind(), err);
                false
            }
        }
    }

    async fn open_link(&self, attempt: u64) -> Result<(), SessionError> {
        let inner = &self.inner;
        tracing::info!("Connecting to {}", inner.url);

        let cancelled = inner.cancel.notified();
        let opened = tokio::select! {
            result = timeout(inner.connect_timeout, inner.transport.open(&inner.url)) => {
                result.unwrap_or(Err(SessionError::ConnectTimeout(inner.connect_timeout)))
            }
            _ = cancelled => Err(SessionError::Cancelled),
        };

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(err) => return Err(self.fail_attempt(attempt, err)),
        };

        let (outbound, commands) = unbounded_channel();
        let generation = {
            let mut link = inner.lock();
            if link.attempt != attempt || link.status != ConnectionStatus::Connecting {
                None
            } else {
                link.status = ConnectionStatus::Connected;
                link.outbound = Some(outbound);
                link.policy.reset();
                link.generation += 1;
                link.last_error = None;
                Some(link.generation)
            }
        };
        let Some(generation) = generation else {
            tracing::debug!("Connection opened after disconnect, closing it");
            let _ = stream.close(NORMAL_CLOSE, CLIENT_CLOSE_REASON).await;
            return Err(SessionError::Cancelled);
        };

        tracing::info!("Connected to {}", inner.url);
        inner.events.dispatch(&SessionEvent::Connected);
        tokio::spawn(self.clone().drive(stream, commands, generation));
        Ok(())
    }

    fn fail_attempt(&self, attempt: u64, err: SessionError) -> SessionError {
        let current = {
            let mut link = self.inner.lock();
            let current =
                link.attempt == attempt && link.status == ConnectionStatus::Connecting;
            if current {
                link.status = ConnectionStatus::Disconnected;
                link.last_error = Some(err.to_string());
            }
            current
        };
        if current {
            tracing::error!("Connection to {} failed: {}", self.inner.url, err);
            self.inner.events.dispatch(&SessionEvent::Error {
                message: err.to_string(),
            });
            err
        } else {
            tracing::debug!("Abandoned connection attempt ended: {}", err);
            SessionError::Cancelled
        }
    }

    async fn drive(
        self,
        mut stream: Box<dyn TransportStream>,
        mut commands: UnboundedReceiver<Command>,
        generation: u64,
    ) {
        let (code, reason, deliberate) = loop {
            tokio::select! {
                // Queued commands, a close in particular, go before incoming frames.
                biased;
                command = commands.recv() => match command {
                    Some(Command::Send(text)) => {
                        if let Err(err) = stream.send_text(text).await {
                            tracing::warn!("Send failed: {}", err);
                        }
                    }
                    Some(Command::Close) | None => {
                        if let Err(err) = stream.close(NORMAL_CLOSE, CLIENT_CLOSE_REASON).await {
                            tracing::debug!("Close handshake failed: {}", err);
                        }
                        break (NORMAL_CLOSE, CLIENT_CLOSE_REASON.to_string(), true);
                    }
                },
                frame = stream.next_frame() => match frame {
                    Some(Ok(Frame::Text(text))) => self.handle_text(&text),
                    Some(Ok(Frame::Close { code, reason })) => break (code, reason, false),
                    Some(Err(err)) => {
                        tracing::error!("Transport error: {}", err);
                        self.inner.events.dispatch(&SessionEvent::Error {
                            message: err.to_string(),
                        });
                        break (ABNORMAL_CLOSE, err.to_string(), false);
                    }
                    None => break (ABNORMAL_CLOSE, "connection lost".to_string(), false),
                },
            }
        };
        self.on_closed(generation, code, reason, deliberate);
    }

    fn handle_text(&self, text: &str) {
        match parse_frame(text) {
            Ok((kind, message)) => {
                tracing::debug!("Received {}", kind);
                self.inner
                    .events
                    .dispatch(&SessionEvent::Message { kind, message });
            }
            Err(err) => tracing::warn!("Dropping frame: {}", err),
        }
    }

    fn on_closed(&self, generation: u64, code: u16, reason: String, deliberate: bool) {
        let reconnect = {
            let mut link = self.inner.lock();
            if link.generation != generation {
                // A newer link is already up.
                return;
            }
            // After `disconnect()` the link is already retired and may be reconnecting.
            let live = link.status == ConnectionStatus::Connected;
            if live {
                link.status = ConnectionStatus::Disconnected;
                link.outbound = None;
            }
            live && !deliberate && !link.manual_close && code != NORMAL_CLOSE
        };

        tracing::info!("Disconnected ({}): {}", code, reason);
        self.inner
            .events
            .dispatch(&SessionEvent::Disconnected { code, reason });

        if reconnect {
            let handle = tokio::spawn(self.clone().reconnect_loop());
            if let Some(previous) = self.inner.lock().reconnect_task.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Retries until a link is up, the budget runs out, or a caller takes over.
    async fn reconnect_loop(self) {
        loop {
            let (delay, number, max) = {
                let mut link = self.inner.lock();
                if link.manual_close || link.status != ConnectionStatus::Disconnected {
                    return;
                }
                match link.policy.next_delay() {
                    Some(delay) => (delay, link.policy.attempts(), link.policy.max_attempts()),
                    None => {
                        tracing::warn!(
                            "Giving up after {} reconnection attempts",
                            link.policy.max_attempts()
                        );
                        return;
                    }
                }
            };

            tracing::info!("Reconnecting in {:?} (attempt {}/{})", delay, number, max);
            sleep(delay).await;

            let attempt = {
                let mut link = self.inner.lock();
                if link.manual_close || link.status != ConnectionStatus::Disconnected {
                    return;
                }
                link.status = ConnectionStatus::Connecting;
                link.attempt += 1;
                link.attempt
            };

            match self.open_link(attempt).await {
                Ok(()) | Err(SessionError::Cancelled) => return,
                Err(err) => tracing::warn!("Reconnection attempt {} failed: {}", number, err),
            }
        }
    }
}
