//! Educational type-effectiveness chart.
//!
//! Used for illustrative previews and explanations only. The battle service
//! owns real damage resolution.

use std::fmt::Display;

use crate::element::ElementType::{self, *};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Effectiveness {
    NoEffect,
    NotVeryEffective,
    Normal,
    SuperEffective,
}

impl Effectiveness {
    pub fn multiplier(self) -> f32 {
        match self {
            Effectiveness::NoEffect => 0.0,
            Effectiveness::NotVeryEffective => 0.5,
            Effectiveness::Normal => 1.0,
            Effectiveness::SuperEffective => 2.0,
        }
    }

    /// Applies the multiplier to a base damage value, rounding to the nearest point.
    pub fn apply(self, damage: u32) -> u32 {
        (damage as f32 * self.multiplier()).round() as u32
    }
}

impl Display for Effectiveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effectiveness::NoEffect => write!(f, "no effect"),
            Effectiveness::NotVeryEffective => write!(f, "not very effective"),
            Effectiveness::Normal => write!(f, "normal"),
            Effectiveness::SuperEffective => write!(f, "super effective"),
        }
    }
}

const X2: Effectiveness = Effectiveness::SuperEffective;
const HALF: Effectiveness = Effectiveness::NotVeryEffective;
const ZERO: Effectiveness = Effectiveness::NoEffect;

fn chart_row(attacking: ElementType) -> &'static [(ElementType, Effectiveness)] {
    match attacking {
        Normal => &[(Rock, HALF), (Ghost, ZERO), (Steel, HALF)],
        Fire => &[
            (Fire, HALF),
            (Water, HALF),
            (Grass, X2),
            (Ice, X2),
            (Bug, X2),
            (Rock, HALF),
            (Dragon, HALF),
            (Steel, X2),
        ],
        Water => &[
            (Fire, X2),
            (Water, HALF),
            (Grass, HALF),
            (Ground, X2),
            (Rock, X2),
            (Dragon, HALF),
        ],
        Electric => &[
            (Water, X2),
            (Electric, HALF),
            (Grass, HALF),
            (Ground, ZERO),
            (Flying, X2),
            (Dragon, HALF),
        ],
        Grass => &[
            (Fire, HALF),
            (Water, X2),
            (Grass, HALF),
            (Poison, HALF),
            (Ground, X2),
            (Rock, X2),
            (Bug, HALF),
            (Dragon, HALF),
            (Steel, HALF),
            (Flying, HALF),
        ],
        Ice => &[
            (Fire, HALF),
            (Water, HALF),
            (Grass, X2),
            (Ice, HALF),
            (Ground, X2),
            (Flying, X2),
            (Dragon, X2),
            (Steel, HALF),
        ],
        Fighting => &[
            (Normal, X2),
            (Ice, X2),
            (Poison, HALF),
            (Flying, HALF),
            (Psychic, HALF),
            (Bug, HALF),
            (Rock, X2),
            (Ghost, ZERO),
            (Dark, X2),
            (Steel, X2),
            (Fairy, HALF),
        ],
        Poison => &[
            (Grass, X2),
            (Poison, HALF),
            (Ground, HALF),
            (Rock, HALF),
            (Ghost, HALF),
            (Steel, ZERO),
            (Fairy, X2),
        ],
        Ground => &[
            (Fire, X2),
            (Electric, X2),
            (Grass, HALF),
            (Poison, X2),
            (Flying, ZERO),
            (Bug, HALF),
            (Rock, X2),
            (Steel, X2),
        ],
        Flying => &[
            (Electric, HALF),
            (Grass, X2),
            (Ice, HALF),
            (Fighting, X2),
            (Bug, X2),
            (Rock, HALF),
            (Steel, HALF),
        ],
        Psychic => &[
            (Fighting, X2),
            (Poison, X2),
            (Psychic, HALF),
            (Dark, ZERO),
            (Steel, HALF),
        ],
        Bug => &[
            (Fire, HALF),
            (Grass, X2),
            (Fighting, HALF),
            (Poison, HALF),
            (Flying, HALF),
            (Psychic, X2),
            (Ghost, HALF),
            (Dark, X2),
            (Steel, HALF),
            (Fairy, HALF),
        ],
        Rock => &[
            (Fire, X2),
            (Ice, X2),
            (Fighting, HALF),
            (Ground, HALF),
            (Flying, X2),
            (Bug, X2),
            (Steel, HALF),
        ],
        Ghost => &[(Normal, ZERO), (Psychic, X2), (Ghost, X2), (Dark, HALF)],
        Dragon => &[(Dragon, X2), (Steel, HALF), (Fairy, ZERO)],
        Dark => &[
            (Fighting, HALF),
            (Psychic, X2),
            (Ghost, X2),
            (Dark, HALF),
            (Fairy, HALF),
        ],
        Steel => &[
            (Fire, HALF),
            (Water, HALF),
            (Electric, HALF),
            (Ice, X2),
            (Rock, X2),
            (Steel, HALF),
            (Fairy, X2),
        ],
        Fairy => &[
            (Fire, HALF),
            (Fighting, X2),
            (Poison, HALF),
            (Dragon, X2),
            (Dark, X2),
            (Steel, HALF),
        ],
        Colorless | Unknown => &[],
    }
}

pub fn effectiveness(attacking: ElementType, defending: ElementType) -> Effectiveness {
    chart_row(attacking)
        .iter()
        .find(|(defender, _)| *defender == defending)
        .map(|(_, effectiveness)| *effectiveness)
        .unwrap_or(Effectiveness::Normal)
}

/// Kid-friendly one-liner describing a matchup.
pub fn explain(attacking: ElementType, defending: ElementType) -> String {
    match effectiveness(attacking, defending) {
        Effectiveness::SuperEffective => format!(
            "{attacking} is super effective against {defending}! Attacks do double damage."
        ),
        Effectiveness::NotVeryEffective => format!(
            "{attacking} is not very effective against {defending}. Attacks only do half damage."
        ),
        Effectiveness::NoEffect => {
            format!("{attacking} attacks have no effect on {defending} at all!")
        }
        Effectiveness::Normal => {
            format!("{attacking} does normal damage against {defending}.")
        }
    }
}
