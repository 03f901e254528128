use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};

use crate::element::ElementType;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub hp: u32,
    #[serde(default)]
    pub types: Vec<ElementType>,
    #[serde(default)]
    pub attacks: Vec<Attack>,
}

/// Attack damage is either a fixed number or a symbolic value such as `"30+"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Damage {
    Fixed(u32),
    Variable(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    pub name: String,
    #[serde(default)]
    pub damage: Damage,
    #[serde(default)]
    pub cost: Vec<ElementType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}

impl Card {
    pub fn new(id: &str, name: &str, hp: u32, types: &[ElementType]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            hp,
            types: types.to_vec(),
            attacks: Vec::new(),
        }
    }

    pub fn with_attack(mut self, attack: Attack) -> Self {
        self.attacks.push(attack);
        self
    }

    pub fn primary_type(&self) -> Option<ElementType> {
        self.types.first().copied()
    }

    pub fn is_knocked_out(&self) -> bool {
        self.hp == 0 && !self.types.is_empty()
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.types.is_empty() {
            return write!(f, "{}", self.name);
        }
        write!(
            f,
            "{} ({} HP, {})",
            self.name,
            self.hp,
            self.types.iter().join("/")
        )
    }
}

impl Default for Damage {
    fn default() -> Self {
        Damage::Fixed(0)
    }
}

impl Damage {
    /// Numeric part of the damage, e.g. `30` for `"30+"` or `"30x"`.
    pub fn base_value(&self) -> u32 {
        match self {
            Damage::Fixed(value) => *value,
            Damage::Variable(text) => {
                let digits: String = text
                    .trim()
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse().unwrap_or(0)
            }
        }
    }
}

impl Display for Damage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Damage::Fixed(value) => write!(f, "{value}"),
            Damage::Variable(text) => write!(f, "{text}"),
        }
    }
}

impl Attack {
    pub fn new(name: &str, damage: Damage, cost: &[ElementType]) -> Self {
        Self {
            name: name.to_string(),
            damage,
            cost: cost.to_vec(),
            effect: None,
        }
    }
}

impl Display for Attack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] ({})",
            self.name,
            self.cost.iter().join(", "),
            self.damage
        )
    }
}
