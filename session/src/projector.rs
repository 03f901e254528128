//! Folds session events into the view a presentation layer renders.

use types::{AiDecision, GameState};

use crate::{events::SessionEvent, game_log::GameLog, protocol::InboundMessage};

pub const DISCONNECTED_BANNER: &str =
    "🔌 Not connected to the battle server. Is the backend running?";

#[derive(Debug, Clone, Default)]
pub struct BattleView {
    pub game_state: Option<GameState>,
    pub ai_thinking: bool,
    pub ai_decision: Option<AiDecision>,
    pub last_error: Option<String>,
    pub connected: bool,
    pub log: GameLog,
}

impl BattleView {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            log: GameLog::with_capacity(log_capacity),
            ..Self::default()
        }
    }

    /// Shown while there is no live link.
    pub fn banner(&self) -> Option<String> {
        if self.connected {
            return None;
        }
        Some(match &self.last_error {
            Some(error) => format!("{DISCONNECTED_BANNER} ({error})"),
            None => DISCONNECTED_BANNER.to_string(),
        })
    }

    /// Applies one event in arrival order and returns the log lines it appended.
    pub fn apply(&mut self, event: &SessionEvent) -> Vec<String> {
        let lines = match event {
            SessionEvent::Connected => {
                self.connected = true;
                self.last_error = None;
                vec!["✅ Connected to the battle server".to_string()]
            }
            SessionEvent::Disconnected { code, reason } => {
                self.connected = false;
                self.ai_thinking = false;
                if reason.is_empty() {
                    vec![format!("🔌 Disconnected ({code})")]
                } else {
                    vec![format!("🔌 Disconnected ({code}): {reason}")]
                }
            }
            SessionEvent::Error { message } => {
                self.last_error = Some(message.clone());
                vec![format!("❌ Connection error: {message}")]
            }
            SessionEvent::Message { message, .. } => self.apply_message(message),
        };
        for line in &lines {
            self.log.push(line.clone());
        }
        lines
    }

    fn apply_message(&mut self, message: &InboundMessage) -> Vec<String> {
        match message {
            InboundMessage::GameStateUpdate { game_state } => {
                self.replace_state(game_state.clone());
                Vec::new()
            }
            InboundMessage::AiThinkingStarted { message } => {
                self.ai_decision = None;
                self.ai_thinking = true;
                vec![message
                    .clone()
                    .unwrap_or_else(|| "🤔 AI is thinking...".to_string())]
            }
            InboundMessage::AiDecisionMade {
                ai_decision,
                game_state,
                educational_context,
            } => {
                self.ai_thinking = false;
                let decision =
                    InboundMessage::merged_decision(ai_decision, educational_context.as_ref());
                let lines = decision.narrative();
                self.ai_decision = Some(decision);
                if let Some(game_state) = game_state {
                    self.replace_state(game_state.clone());
                }
                lines
            }
            InboundMessage::AiError { message, error } => {
                self.ai_thinking = false;
                let text = message
                    .as_deref()
                    .or(error.as_deref())
                    .unwrap_or("The AI could not finish its turn");
                vec![format!("❌ {text}")]
            }
            InboundMessage::PlayerActionResult {
                action_type,
                result,
                game_state,
            } => {
                if let Some(game_state) = game_state {
                    self.replace_state(game_state.clone());
                }
                match result.get("message").and_then(|m| m.as_str()) {
                    Some(text) => vec![text.to_string()],
                    None => action_type
                        .iter()
                        .map(|action| format!("✔️ {action}"))
                        .collect(),
                }
            }
            InboundMessage::GameReset {
                message,
                game_log,
                game_state,
            } => {
                if let Some(game_state) = game_state {
                    self.game_state = Some(game_state.clone());
                }
                self.ai_thinking = false;
                self.ai_decision = None;
                // The restart narrative replaces the transcript instead of extending it.
                self.log.clear();
                match (game_log, message) {
                    (Some(entries), _) if !entries.is_empty() => entries.clone(),
                    (_, Some(message)) => vec![message.clone()],
                    _ => vec!["🔄 New game started!".to_string()],
                }
            }
            InboundMessage::TypeAdvice {
                attacking_type,
                defending_type,
                explanation,
                ..
            } => vec![format!("🎓 {attacking_type} vs {defending_type}: {explanation}")],
            InboundMessage::AiTurnReady { message } => message.iter().cloned().collect(),
            InboundMessage::Error { message, .. } => vec![format!("❌ {message}")],
            InboundMessage::Unknown => Vec::new(),
        }
    }

    fn replace_state(&mut self, next: GameState) {
        if let Some(current) = &self.game_state {
            if !current.game_phase.can_advance_to(next.game_phase) {
                tracing::warn!(
                    "Game phase moved back from {} to {} without a reset",
                    current.game_phase,
                    next.game_phase
                );
            }
        }
        self.game_state = Some(next);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use types::GamePhase;

    use super::*;

    fn message(message: InboundMessage) -> SessionEvent {
        SessionEvent::Message {
            kind: "test".to_string(),
            message,
        }
    }

    fn state(turn_number: u32) -> GameState {
        let mut state = GameState::new("Ash", "Gary");
        state.turn_number = turn_number;
        state.game_phase = GamePhase::Playing;
        state
    }

    #[test]
    fn test_thinking_then_decision() {
        let mut view = BattleView::new(20);
        view.ai_decision = Some(AiDecision::default());

        view.apply(&message(InboundMessage::AiThinkingStarted { message: None }));
        assert!(view.ai_thinking);
        assert!(view.ai_decision.is_none());

        let lines = view.apply(&message(InboundMessage::AiDecisionMade {
            ai_decision: AiDecision {
                action: "attack".to_string(),
                explanation: "Perfect! My Squirtle has type advantage!".to_string(),
                type_lesson: Some("Water beats Fire".to_string()),
                strategic_insight: None,
            },
            game_state: Some(state(3)),
            educational_context: None,
        }));
        assert!(!view.ai_thinking);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Perfect! My Squirtle has type advantage!"));
        assert!(lines[1].contains("Water beats Fire"));
        assert_eq!(view.game_state.as_ref().unwrap().turn_number, 3);
    }

    #[test]
    fn test_ai_error_leaves_state_alone() {
        let mut view = BattleView::new(20);
        view.game_state = Some(state(4));
        view.ai_thinking = true;

        let lines = view.apply(&message(InboundMessage::AiError {
            message: Some("AI error: model unavailable".to_string()),
            error: None,
        }));
        assert!(!view.ai_thinking);
        assert_eq!(lines, vec!["❌ AI error: model unavailable"]);
        assert_eq!(view.game_state, Some(state(4)));
    }

    #[test]
    fn test_action_result_logs_server_message() {
        let mut view = BattleView::new(20);
        let lines = view.apply(&message(InboundMessage::PlayerActionResult {
            action_type: Some("draw_card".to_string()),
            result: json!({"success": true, "message": "You drew Pikachu!"}),
            game_state: Some(state(2)),
        }));
        assert_eq!(lines, vec!["You drew Pikachu!"]);
        assert!(view.game_state.is_some());
    }

    #[test]
    fn test_banner_tracks_connection() {
        let mut view = BattleView::new(20);
        assert!(view.banner().unwrap().contains("Is the backend running?"));
        view.apply(&SessionEvent::Connected);
        assert!(view.banner().is_none());
        view.apply(&SessionEvent::Disconnected {
            code: 1006,
            reason: String::new(),
        });
        assert!(view.banner().is_some());
        assert_eq!(view.log.latest(), Some("🔌 Disconnected (1006)"));
    }

    #[test]
    fn test_reset_replaces_transcript() {
        let mut view = BattleView::new(20);
        view.log.push("old line");
        view.ai_thinking = true;
        let lines = view.apply(&message(InboundMessage::GameReset {
            message: Some("Game reset".to_string()),
            game_log: Some(vec!["🎮 New game!".to_string(), "Ash goes first".to_string()]),
            game_state: Some(GameState::new("Ash", "Gary")),
        }));
        assert_eq!(lines.len(), 2);
        assert_eq!(view.log.to_vec(), vec!["🎮 New game!", "Ash goes first"]);
        assert!(!view.ai_thinking);
    }

    #[test]
    fn test_unknown_messages_are_ignored() {
        let mut view = BattleView::new(20);
        assert!(view.apply(&message(InboundMessage::Unknown)).is_empty());
        assert!(view.log.is_empty());
    }
}
