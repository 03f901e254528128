pub mod board_checks;
pub mod client;
pub mod error;
pub mod judge;

pub use board_checks::BoardChecks;
pub use client::ToolClient;
pub use error::ToolError;
pub use judge::{BoardSummary, Judge, MoveVerdict, ProposedAction, TurnPlayer};
