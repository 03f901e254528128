use std::fmt::Display;

use serde_json::{json, Value};

/// A named player intent. The battle service decides what it actually does.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerAction {
    DrawCard,
    PlayPokemon { card_id: String },
    Attack { attack_index: usize, damage: Option<u32> },
    Retreat { bench_index: usize },
    EndTurn,
    Custom { action_type: String, data: Value },
}

impl PlayerAction {
    pub fn action_type(&self) -> &str {
        match self {
            PlayerAction::DrawCard => "draw_card",
            PlayerAction::PlayPokemon { .. } => "play_pokemon",
            PlayerAction::Attack { .. } => "attack",
            PlayerAction::Retreat { .. } => "retreat",
            PlayerAction::EndTurn => "end_turn",
            PlayerAction::Custom { action_type, .. } => action_type,
        }
    }

    /// Opaque payload sent alongside the action type.
    pub fn data(&self) -> Value {
        match self {
            PlayerAction::DrawCard | PlayerAction::EndTurn => json!({}),
            PlayerAction::PlayPokemon { card_id } => json!({ "card_id": card_id }),
            PlayerAction::Attack {
                attack_index,
                damage: Some(damage),
            } => json!({ "attack_index": attack_index, "damage": damage }),
            PlayerAction::Attack {
                attack_index,
                damage: None,
            } => json!({ "attack_index": attack_index }),
            PlayerAction::Retreat { bench_index } => json!({ "bench_index": bench_index }),
            PlayerAction::Custom { data, .. } => data.clone(),
        }
    }
}

impl Display for PlayerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = match self {
            PlayerAction::DrawCard => "Draw a card".to_string(),
            PlayerAction::PlayPokemon { card_id } => format!("Play {card_id}"),
            PlayerAction::Attack { attack_index, .. } => format!("Attack #{}", attack_index + 1),
            PlayerAction::Retreat { bench_index } => {
                format!("Retreat to bench slot {}", bench_index + 1)
            }
            PlayerAction::EndTurn => "End turn".to_string(),
            PlayerAction::Custom { action_type, .. } => action_type.clone(),
        };
        write!(f, "{}", string)
    }
}
