use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::card::Card;

pub const MAX_BENCH_SIZE: usize = 5;
pub const STARTING_PRIZE_CARDS: u32 = 6;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Child,
    Ai,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Child => Side::Ai,
            Side::Ai => Side::Child,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Child => write!(f, "child"),
            Side::Ai => write!(f, "ai"),
        }
    }
}

/// The local player's hand is sent in full; the opponent's only as a count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandView {
    Known {
        hand: Vec<Card>,
    },
    Hidden {
        #[serde(default)]
        hand_count: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(rename = "active_pokemon", default)]
    pub active: Option<Card>,
    #[serde(rename = "benched_pokemon", default)]
    pub bench: Vec<Card>,
    #[serde(flatten)]
    pub hand: HandView,
    #[serde(default = "starting_prize_cards")]
    pub prize_cards: u32,
}

fn starting_prize_cards() -> u32 {
    STARTING_PRIZE_CARDS
}

impl Player {
    pub fn new_local(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: None,
            bench: Vec::new(),
            hand: HandView::Known { hand: Vec::new() },
            prize_cards: STARTING_PRIZE_CARDS,
        }
    }

    pub fn new_hidden(name: &str, hand_count: usize) -> Self {
        Self {
            name: name.to_string(),
            active: None,
            bench: Vec::new(),
            hand: HandView::Hidden { hand_count },
            prize_cards: STARTING_PRIZE_CARDS,
        }
    }

    /// Cards in hand, empty when the hand is hidden.
    pub fn hand_cards(&self) -> &[Card] {
        match &self.hand {
            HandView::Known { hand } => hand,
            HandView::Hidden { .. } => &[],
        }
    }

    pub fn hand_count(&self) -> usize {
        match &self.hand {
            HandView::Known { hand } => hand.len(),
            HandView::Hidden { hand_count } => *hand_count,
        }
    }

    pub fn bench_is_full(&self) -> bool {
        self.bench.len() >= MAX_BENCH_SIZE
    }

    pub fn in_play(&self) -> impl Iterator<Item = &Card> {
        self.active.iter().chain(self.bench.iter())
    }
}

impl Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self
            .active
            .as_ref()
            .map(|card| card.to_string())
            .unwrap_or("None".to_string());
        write!(
            f,
            "{}: active {}, bench {}/{}, hand {}, prizes {}",
            self.name,
            active,
            self.bench.len(),
            MAX_BENCH_SIZE,
            self.hand_count(),
            self.prize_cards
        )
    }
}
