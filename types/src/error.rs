use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptimisticError {
    #[error("The game is already finished")]
    GameFinished,

    #[error("No active Pokemon for {0}")]
    NoActivePokemon(String),

    #[error("Card not in hand: {0}")]
    CardNotInHand(String),

    #[error("The bench is full ({0} Pokemon limit)")]
    BenchFull(usize),

    #[error("No Pokemon in bench slot {0}")]
    InvalidBenchIndex(usize),

    #[error("No attack at index {0}")]
    InvalidAttackIndex(usize),

    #[error("The local player's hand is hidden")]
    HandHidden,
}
