use serde_json::json;

use crate::{client::ToolClient, error::ToolError, judge::MoveVerdict};

pub const BOARD_CHECKS_PROTOCOL: &str = "mcp/game-state";

/// Deterministic rule checks served next to the judge.
#[derive(Debug, Clone)]
pub struct BoardChecks {
    client: ToolClient,
}

impl BoardChecks {
    pub fn new(client: ToolClient) -> Self {
        Self { client }
    }

    pub async fn is_card_in_hand(
        &self,
        card_name: &str,
        hand: &[String],
    ) -> Result<MoveVerdict, ToolError> {
        self.client
            .call(
                BOARD_CHECKS_PROTOCOL,
                "is_card_in_hand",
                &json!({ "card_name": card_name, "hand": hand }),
            )
            .await
    }

    pub async fn is_bench_full(&self, bench: &[String]) -> Result<bool, ToolError> {
        self.client
            .call(BOARD_CHECKS_PROTOCOL, "is_bench_full", &json!({ "bench": bench }))
            .await
    }

    pub async fn is_first_action_of_turn(
        &self,
        actions_taken_this_turn: u32,
    ) -> Result<bool, ToolError> {
        self.client
            .call(
                BOARD_CHECKS_PROTOCOL,
                "is_first_action_of_turn",
                &json!({ "actions_taken_this_turn": actions_taken_this_turn }),
            )
            .await
    }
}
