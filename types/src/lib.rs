pub mod action;
pub mod ai_decision;
pub mod card;
pub mod element;
pub mod error;
pub mod game_state;
pub mod optimistic;
pub mod player;
pub mod type_chart;

pub use action::PlayerAction;
pub use ai_decision::AiDecision;
pub use card::{Attack, Card, Damage};
pub use element::ElementType;
pub use error::OptimisticError;
pub use game_state::{GamePhase, GameState};
pub use optimistic::{
    apply_optimistic_attack, apply_optimistic_draw, apply_optimistic_play,
    apply_optimistic_retreat, attack_damage, placeholder_card,
};
pub use player::{HandView, Player, Side, MAX_BENCH_SIZE, STARTING_PRIZE_CARDS};
pub use type_chart::Effectiveness;
