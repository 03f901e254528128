use types::{ElementType, PlayerAction};

use crate::{connection::ConnectionManager, protocol::OutboundMessage};

/// Turns intents into outbound messages. Each call sends exactly one message, or nothing when
/// the link is down.
#[derive(Clone)]
pub struct ActionDispatcher {
    connection: ConnectionManager,
}

impl ActionDispatcher {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    pub fn simulate_ai_turn(&self) -> bool {
        self.connection.send(&OutboundMessage::simulate_ai_turn())
    }

    pub fn submit_action(&self, action: &PlayerAction) -> bool {
        tracing::info!("Submitting action: {}", action);
        self.connection.send(&OutboundMessage::player_action(action))
    }

    pub fn request_game_state(&self) -> bool {
        self.connection.send(&OutboundMessage::GetGameState)
    }

    pub fn reset_game(&self) -> bool {
        self.connection.send(&OutboundMessage::reset_game())
    }

    pub fn request_type_advice(&self, attacking: ElementType, defending: ElementType) -> bool {
        self.connection
            .send(&OutboundMessage::type_advice(attacking, defending))
    }
}
