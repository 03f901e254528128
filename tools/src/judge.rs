//! Move validation by the remote judge.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use types::{Card, GameState, Side};

use crate::{client::ToolClient, error::ToolError};

pub const JUDGE_PROTOCOL: &str = "mcp/judge";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPlayer {
    Player,
    Opponent,
}

/// Card names per zone, seen from the local player's side of the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub turn_player: TurnPlayer,
    #[serde(default)]
    pub player_hand: Vec<String>,
    #[serde(default)]
    pub player_deck: Vec<String>,
    #[serde(default)]
    pub player_bench: Vec<String>,
    #[serde(default)]
    pub opponent_hand: Vec<String>,
    #[serde(default)]
    pub opponent_deck: Vec<String>,
    #[serde(default)]
    pub opponent_bench: Vec<String>,
    pub turn_count: u32,
    #[serde(default)]
    pub actions_taken_this_turn: u32,
}

impl BoardSummary {
    pub fn with_actions_taken(mut self, actions_taken_this_turn: u32) -> Self {
        self.actions_taken_this_turn = actions_taken_this_turn;
        self
    }
}

impl From<&GameState> for BoardSummary {
    fn from(state: &GameState) -> Self {
        let names = |cards: &[Card]| -> Vec<String> { cards.iter().map(|c| c.name.clone()).collect() };
        Self {
            turn_player: match state.current_turn {
                Side::Child => TurnPlayer::Player,
                Side::Ai => TurnPlayer::Opponent,
            },
            player_hand: names(state.child_player.hand_cards()),
            player_deck: Vec::new(),
            player_bench: names(&state.child_player.bench),
            opponent_hand: names(state.ai_player.hand_cards()),
            opponent_deck: Vec::new(),
            opponent_bench: names(&state.ai_player.bench),
            turn_count: state.turn_number,
            actions_taken_this_turn: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedAction {
    pub action_type: String,
    #[serde(default)]
    pub card_name: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

impl ProposedAction {
    pub fn new(action_type: &str) -> Self {
        Self {
            action_type: action_type.to_string(),
            card_name: None,
            target: None,
        }
    }

    pub fn play_card(card_name: &str) -> Self {
        Self {
            card_name: Some(card_name.to_string()),
            ..Self::new("play_card")
        }
    }
}

/// Judge verdicts arrive as `VALID` or `INVALID: <reason>`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MoveVerdict {
    Valid,
    Invalid(String),
}

impl MoveVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, MoveVerdict::Valid)
    }
}

impl From<String> for MoveVerdict {
    fn from(text: String) -> Self {
        MoveVerdict::from(text.as_str())
    }
}

impl From<&str> for MoveVerdict {
    fn from(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case("valid") {
            return MoveVerdict::Valid;
        }
        let reason = match text.split_once(':') {
            Some((head, reason)) if head.trim().eq_ignore_ascii_case("invalid") => reason.trim(),
            // Anything else is not a clean approval.
            _ => text,
        };
        MoveVerdict::Invalid(reason.to_string())
    }
}

impl Display for MoveVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveVerdict::Valid => write!(f, "VALID"),
            MoveVerdict::Invalid(reason) => write!(f, "INVALID: {reason}"),
        }
    }
}

#[derive(Serialize)]
struct ValidateMove<'a> {
    game_state: &'a BoardSummary,
    proposed_action: &'a ProposedAction,
}

#[derive(Debug, Clone)]
pub struct Judge {
    client: ToolClient,
}

impl Judge {
    pub fn new(client: ToolClient) -> Self {
        Self { client }
    }

    pub async fn validate_move(
        &self,
        board: &BoardSummary,
        action: &ProposedAction,
    ) -> Result<MoveVerdict, ToolError> {
        let verdict: MoveVerdict = self
            .client
            .call(
                JUDGE_PROTOCOL,
                "validate_move",
                &ValidateMove {
                    game_state: board,
                    proposed_action: action,
                },
            )
            .await?;
        tracing::info!("Judge says {} for {}", verdict, action.action_type);
        Ok(verdict)
    }
}
