//! Typed publish/subscribe registry keyed by channel name.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use crate::{error::HandlerError, protocol::InboundMessage};

pub const CONNECTED: &str = "connected";
pub const DISCONNECTED: &str = "disconnected";
pub const ERROR: &str = "error";
/// Receives every inbound protocol message after its type-specific handlers.
pub const MESSAGE: &str = "message";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connected,
    Disconnected { code: u16, reason: String },
    Error { message: String },
    Message { kind: String, message: InboundMessage },
}

impl SessionEvent {
    pub fn channel(&self) -> &str {
        match self {
            SessionEvent::Connected => CONNECTED,
            SessionEvent::Disconnected { .. } => DISCONNECTED,
            SessionEvent::Error { .. } => ERROR,
            SessionEvent::Message { kind, .. } => kind.as_str(),
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, SessionEvent::Message { .. })
    }
}

type Handler = Arc<dyn Fn(&SessionEvent) -> Result<(), HandlerError> + Send + Sync>;

struct Registration {
    id: u64,
    channel: String,
    handler: Handler,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    registrations: Vec<Registration>,
}

#[derive(Clone, Default)]
pub struct EventRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

/// Handle returned by [`EventRegistry::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<RegistryInner>>,
}

impl Subscription {
    /// Removes the handler. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(inner) => {
                let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
                let before = inner.registrations.len();
                inner.registrations.retain(|r| r.id != self.id);
                inner.registrations.len() != before
            }
            None => false,
        }
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, channel: &str, handler: F) -> Subscription
    where
        F: Fn(&SessionEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.registrations.push(Registration {
            id,
            channel: channel.to_string(),
            handler: Arc::new(handler),
        });
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn handler_count(&self, channel: &str) -> usize {
        self.lock()
            .registrations
            .iter()
            .filter(|r| r.channel == channel)
            .count()
    }

    pub fn clear(&self) {
        self.lock().registrations.clear();
    }

    /// Delivers `event` to its channel's handlers, then to `MESSAGE` handlers for protocol
    /// messages. A failing handler is logged and skipped. Returns how many handlers succeeded.
    pub fn dispatch(&self, event: &SessionEvent) -> usize {
        let channel = event.channel();
        let handlers: Vec<Handler> = {
            let inner = self.lock();
            let specific = inner
                .registrations
                .iter()
                .filter(|r| r.channel == channel)
                .map(|r| Arc::clone(&r.handler));
            let wildcard = inner
                .registrations
                .iter()
                .filter(|r| event.is_message() && r.channel == MESSAGE)
                .map(|r| Arc::clone(&r.handler));
            specific.chain(wildcard).collect()
        };

        let mut delivered = 0;
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => {
                    tracing::error!("Handler for {} failed: {}", channel, err);
                }
                Err(_) => {
                    tracing::error!("Handler for {} panicked", channel);
                }
            }
        }
        delivered
    }
}
