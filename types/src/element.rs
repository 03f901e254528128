use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Elemental type of a card or an energy cost token.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
    Colorless,
    Unknown,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown element type: {0}")]
pub struct ParseElementError(pub String);

impl ElementType {
    /// Every type that appears in the effectiveness chart.
    pub const CHART: [ElementType; 18] = [
        ElementType::Normal,
        ElementType::Fire,
        ElementType::Water,
        ElementType::Electric,
        ElementType::Grass,
        ElementType::Ice,
        ElementType::Fighting,
        ElementType::Poison,
        ElementType::Ground,
        ElementType::Flying,
        ElementType::Psychic,
        ElementType::Bug,
        ElementType::Rock,
        ElementType::Ghost,
        ElementType::Dragon,
        ElementType::Dark,
        ElementType::Steel,
        ElementType::Fairy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Normal => "normal",
            ElementType::Fire => "fire",
            ElementType::Water => "water",
            ElementType::Electric => "electric",
            ElementType::Grass => "grass",
            ElementType::Ice => "ice",
            ElementType::Fighting => "fighting",
            ElementType::Poison => "poison",
            ElementType::Ground => "ground",
            ElementType::Flying => "flying",
            ElementType::Psychic => "psychic",
            ElementType::Bug => "bug",
            ElementType::Rock => "rock",
            ElementType::Ghost => "ghost",
            ElementType::Dragon => "dragon",
            ElementType::Dark => "dark",
            ElementType::Steel => "steel",
            ElementType::Fairy => "fairy",
            ElementType::Colorless => "colorless",
            ElementType::Unknown => "unknown",
        }
    }
}

impl Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => Ok(()),
        }
    }
}

impl FromStr for ElementType {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // enum reprs such as "PokemonType.FIRE" keep the name after the dot
        let name = s.rsplit('.').next().unwrap_or(s).trim().to_lowercase();
        let element = match name.as_str() {
            "normal" => ElementType::Normal,
            "fire" => ElementType::Fire,
            "water" => ElementType::Water,
            "electric" | "lightning" => ElementType::Electric,
            "grass" => ElementType::Grass,
            "ice" => ElementType::Ice,
            "fighting" => ElementType::Fighting,
            "poison" => ElementType::Poison,
            "ground" => ElementType::Ground,
            "flying" => ElementType::Flying,
            "psychic" => ElementType::Psychic,
            "bug" => ElementType::Bug,
            "rock" => ElementType::Rock,
            "ghost" => ElementType::Ghost,
            "dragon" => ElementType::Dragon,
            "dark" | "darkness" => ElementType::Dark,
            "steel" | "metal" => ElementType::Steel,
            "fairy" => ElementType::Fairy,
            "colorless" => ElementType::Colorless,
            _ => return Err(ParseElementError(s.to_string())),
        };
        Ok(element)
    }
}

impl<'de> Deserialize<'de> for ElementType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_else(|_| {
            log::warn!("Unrecognised element type {raw:?}, treating as unknown");
            ElementType::Unknown
        }))
    }
}
