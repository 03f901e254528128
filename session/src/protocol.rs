//! Wire messages exchanged with the battle service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use types::{AiDecision, ElementType, GameState, PlayerAction};

use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    SimulateAiTurn {
        timestamp: DateTime<Utc>,
    },
    PlayerAction {
        action_type: String,
        action_data: Value,
        timestamp: DateTime<Utc>,
    },
    GetGameState,
    ResetGame {
        timestamp: DateTime<Utc>,
    },
    GetTypeAdvice {
        attacking_type: String,
        defending_type: String,
    },
}

impl OutboundMessage {
    pub fn simulate_ai_turn() -> Self {
        OutboundMessage::SimulateAiTurn {
            timestamp: Utc::now(),
        }
    }

    pub fn player_action(action: &PlayerAction) -> Self {
        OutboundMessage::PlayerAction {
            action_type: action.action_type().to_string(),
            action_data: action.data(),
            timestamp: Utc::now(),
        }
    }

    pub fn reset_game() -> Self {
        OutboundMessage::ResetGame {
            timestamp: Utc::now(),
        }
    }

    pub fn type_advice(attacking: ElementType, defending: ElementType) -> Self {
        OutboundMessage::GetTypeAdvice {
            attacking_type: attacking.to_string(),
            defending_type: defending.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::SimulateAiTurn { .. } => "simulate_ai_turn",
            OutboundMessage::PlayerAction { .. } => "player_action",
            OutboundMessage::GetGameState => "get_game_state",
            OutboundMessage::ResetGame { .. } => "reset_game",
            OutboundMessage::GetTypeAdvice { .. } => "get_type_advice",
        }
    }
}

/// Lesson text the service may send next to a decision.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EducationalContext {
    #[serde(default)]
    pub type_lesson: Option<String>,
    #[serde(default)]
    pub strategic_insight: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    GameStateUpdate {
        game_state: GameState,
    },
    AiThinkingStarted {
        #[serde(default)]
        message: Option<String>,
    },
    AiDecisionMade {
        ai_decision: AiDecision,
        #[serde(default)]
        game_state: Option<GameState>,
        #[serde(default)]
        educational_context: Option<EducationalContext>,
    },
    AiError {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    PlayerActionResult {
        #[serde(default)]
        action_type: Option<String>,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        game_state: Option<GameState>,
    },
    GameReset {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        game_log: Option<Vec<String>>,
        #[serde(default)]
        game_state: Option<GameState>,
    },
    TypeAdvice {
        attacking_type: String,
        defending_type: String,
        #[serde(default)]
        effectiveness: Option<f64>,
        explanation: String,
    },
    AiTurnReady {
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        message: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// The decision with lesson text filled in from the educational context when missing.
    pub fn merged_decision(
        decision: &AiDecision,
        context: Option<&EducationalContext>,
    ) -> AiDecision {
        let mut merged = decision.clone();
        if let Some(context) = context {
            if merged.type_lesson.is_none() {
                merged.type_lesson = context.type_lesson.clone();
            }
            if merged.strategic_insight.is_none() {
                merged.strategic_insight = context.strategic_insight.clone();
            }
        }
        merged
    }
}

/// Splits a text frame into its `type` discriminator and decoded message.
pub fn parse_frame(text: &str) -> Result<(String, InboundMessage), SessionError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SessionError::Malformed("missing type discriminator".to_string()))?
        .to_string();
    let message = serde_json::from_value(value)
        .map_err(|e| SessionError::Malformed(format!("{kind}: {e}")))?;
    Ok((kind, message))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_outbound_shapes() {
        let value = serde_json::to_value(OutboundMessage::simulate_ai_turn()).unwrap();
        assert_eq!(value["type"], "simulate_ai_turn");
        assert!(value["timestamp"].is_string());

        let value = serde_json::to_value(OutboundMessage::GetGameState).unwrap();
        assert_eq!(value, json!({"type": "get_game_state"}));

        let value = serde_json::to_value(OutboundMessage::type_advice(
            ElementType::Fire,
            ElementType::Grass,
        ))
        .unwrap();
        assert_eq!(
            value,
            json!({"type": "get_type_advice", "attacking_type": "Fire", "defending_type": "Grass"})
        );

        let value =
            serde_json::to_value(OutboundMessage::player_action(&PlayerAction::DrawCard)).unwrap();
        assert_eq!(value["type"], "player_action");
        assert_eq!(value["action_type"], "draw_card");
        assert_eq!(value["action_data"], json!({}));
    }

    #[test]
    fn test_parse_known_and_unknown_frames() {
        let (kind, message) =
            parse_frame(r#"{"type": "ai_thinking_started", "message": "Hmm..."}"#).unwrap();
        assert_eq!(kind, "ai_thinking_started");
        assert_eq!(
            message,
            InboundMessage::AiThinkingStarted {
                message: Some("Hmm...".to_string())
            }
        );

        let (kind, message) = parse_frame(r#"{"type": "confetti", "amount": 3}"#).unwrap();
        assert_eq!(kind, "confetti");
        assert_eq!(message, InboundMessage::Unknown);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_frame("{not json"),
            Err(SessionError::Serialization(_))
        ));
        assert!(matches!(
            parse_frame(r#"{"message": "no type"}"#),
            Err(SessionError::Malformed(_))
        ));
        assert!(matches!(
            parse_frame(r#"{"type": "type_advice"}"#),
            Err(SessionError::Malformed(_))
        ));
    }

    #[test]
    fn test_decision_lesson_falls_back_to_context() {
        let (_, message) = parse_frame(
            r#"{
                "type": "ai_decision_made",
                "ai_decision": {"action": "attack", "explanation": "Splash!"},
                "educational_context": {"type_lesson": "Water beats Fire"}
            }"#,
        )
        .unwrap();
        match message {
            InboundMessage::AiDecisionMade {
                ai_decision,
                educational_context,
                game_state,
            } => {
                assert!(game_state.is_none());
                let merged =
                    InboundMessage::merged_decision(&ai_decision, educational_context.as_ref());
                assert_eq!(merged.type_lesson.as_deref(), Some("Water beats Fire"));
            }
            other => panic!("unexpected message {other:?}"),
        }
    }
}
