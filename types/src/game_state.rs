use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::player::{Player, Side};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Setup,
    Playing,
    Finished,
}

impl GamePhase {
    fn rank(self) -> u8 {
        match self {
            GamePhase::Setup => 0,
            GamePhase::Playing => 1,
            GamePhase::Finished => 2,
        }
    }

    /// Phases only move forward during a game; going back requires a reset.
    pub fn can_advance_to(self, next: GamePhase) -> bool {
        next.rank() >= self.rank()
    }
}

impl Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GamePhase::Setup => write!(f, "setup"),
            GamePhase::Playing => write!(f, "playing"),
            GamePhase::Finished => write!(f, "finished"),
        }
    }
}

/// Mirror of the battle service's snapshot. Replaced wholesale on every push.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub current_turn: Side,
    pub turn_number: u32,
    pub game_phase: GamePhase,
    pub child_player: Player,
    pub ai_player: Player,
    #[serde(default)]
    pub winner: Option<Side>,
}

impl GameState {
    pub fn new(child_name: &str, ai_name: &str) -> Self {
        Self {
            current_turn: Side::Child,
            turn_number: 1,
            game_phase: GamePhase::Setup,
            child_player: Player::new_local(child_name),
            ai_player: Player::new_hidden(ai_name, 0),
            winner: None,
        }
    }

    pub fn player(&self, side: Side) -> &Player {
        match side {
            Side::Child => &self.child_player,
            Side::Ai => &self.ai_player,
        }
    }

    pub fn player_mut(&mut self, side: Side) -> &mut Player {
        match side {
            Side::Child => &mut self.child_player,
            Side::Ai => &mut self.ai_player,
        }
    }

    pub fn current_player(&self) -> &Player {
        self.player(self.current_turn)
    }

    pub fn is_finished(&self) -> bool {
        self.game_phase == GamePhase::Finished
    }
}

impl Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let winner_str = self
            .winner
            .map(|side| side.to_string())
            .unwrap_or("None".to_string());
        write!(
            f,
            "\nTurn {} ({}) [{}] Winner: {}\n{}\n{}",
            self.turn_number,
            self.current_turn,
            self.game_phase,
            winner_str,
            self.child_player,
            self.ai_player
        )
    }
}
