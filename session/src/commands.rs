//! Line commands for the terminal client.

use std::fmt::Display;

use regex::{Captures, Regex};
use types::ElementType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AiTurn,
    Draw,
    Play(String),
    /// Zero-based attack slot.
    Attack(usize),
    /// Zero-based bench slot.
    Retreat(usize),
    EndTurn,
    State,
    Reset,
    Advice(ElementType, ElementType),
    /// Ask the judge whether playing the named card is legal.
    Check(String),
    Connect,
    Disconnect,
    Log,
    Help,
    Quit,
}

pub const HELP: &str = "Commands: ai | draw | play <card id> | attack <n> | retreat <n> | end | \
state | reset | advice <attacking> <defending> | check <card name> | connect | disconnect | log | help | quit";

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::AiTurn => write!(f, "ai"),
            Command::Draw => write!(f, "draw"),
            Command::Play(card_id) => write!(f, "play {card_id}"),
            Command::Attack(index) => write!(f, "attack {}", index + 1),
            Command::Retreat(index) => write!(f, "retreat {}", index + 1),
            Command::EndTurn => write!(f, "end"),
            Command::State => write!(f, "state"),
            Command::Reset => write!(f, "reset"),
            Command::Advice(attacking, defending) => write!(f, "advice {attacking} {defending}"),
            Command::Check(card_name) => write!(f, "check {card_name}"),
            Command::Connect => write!(f, "connect"),
            Command::Disconnect => write!(f, "disconnect"),
            Command::Log => write!(f, "log"),
            Command::Help => write!(f, "help"),
            Command::Quit => write!(f, "quit"),
        }
    }
}

pub fn parse_command(input: &str) -> Result<Command, String> {
    let trimmed = input.trim();
    let lowered = trimmed.to_lowercase();

    let simple = match lowered.as_str() {
        "ai" | "ai turn" => Some(Command::AiTurn),
        "draw" => Some(Command::Draw),
        "end" | "end turn" => Some(Command::EndTurn),
        "state" => Some(Command::State),
        "reset" => Some(Command::Reset),
        "connect" => Some(Command::Connect),
        "disconnect" => Some(Command::Disconnect),
        "log" => Some(Command::Log),
        "help" | "?" => Some(Command::Help),
        "quit" | "exit" | "q" => Some(Command::Quit),
        _ => None,
    };
    if let Some(command) = simple {
        return Ok(command);
    }

    // Card ids are case-sensitive.
    let play_re = Regex::new(r"^(?i:play)\s+(?<card>\S+)$").expect("Valid play regex");
    if let Some(captures) = play_re.captures(trimmed) {
        return Ok(Command::Play(captures["card"].to_string()));
    }

    let check_re = Regex::new(r"^(?i:check)\s+(?<card>.+)$").expect("Valid check regex");
    if let Some(captures) = check_re.captures(trimmed) {
        return Ok(Command::Check(captures["card"].trim().to_string()));
    }

    let slot_re =
        Regex::new(r"^(?<verb>attack|retreat)\s+(?<slot>\d+)$").expect("Valid slot regex");
    if let Some(captures) = slot_re.captures(&lowered) {
        let slot = slot_from_captures(&captures)?;
        return Ok(match &captures["verb"] {
            "attack" => Command::Attack(slot),
            _ => Command::Retreat(slot),
        });
    }

    let advice_re = Regex::new(r"^advice\s+(?<attacking>[a-z.]+)\s+(?<defending>[a-z.]+)$")
        .expect("Valid advice regex");
    if let Some(captures) = advice_re.captures(&lowered) {
        let attacking = captures["attacking"]
            .parse::<ElementType>()
            .map_err(|e| e.to_string())?;
        let defending = captures["defending"]
            .parse::<ElementType>()
            .map_err(|e| e.to_string())?;
        return Ok(Command::Advice(attacking, defending));
    }

    Err(format!("Unrecognized command: {trimmed}"))
}

/// Slots are typed 1-based.
fn slot_from_captures(captures: &Captures) -> Result<usize, String> {
    let slot: usize = captures["slot"]
        .parse()
        .map_err(|e| format!("Invalid slot number: {e}"))?;
    slot.checked_sub(1)
        .ok_or_else(|| "Slots start at 1".to_string())
}
