pub mod backoff;
pub mod commands;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod game_log;
pub mod projector;
pub mod protocol;
pub mod session;
pub mod transport;

pub use backoff::ReconnectPolicy;
pub use config::{ClientConfig, CliOverrides};
pub use connection::{ConnectionManager, ConnectionStatus};
pub use dispatcher::ActionDispatcher;
pub use error::{HandlerError, SessionError};
pub use events::{EventRegistry, SessionEvent, Subscription};
pub use game_log::GameLog;
pub use projector::BattleView;
pub use protocol::{InboundMessage, OutboundMessage};
pub use session::GameSession;
pub use transport::{Frame, MemoryTransport, Transport, TransportStream, WsTransport};
