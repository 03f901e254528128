//! Latency-hiding previews of player actions.
//!
//! Each function takes the current mirrored state and returns the next one
//! without touching the input. Results are overwritten by the next snapshot
//! the battle service pushes.

use rand::{seq::SliceRandom, Rng};

use crate::{
    card::{Attack, Card, Damage},
    element::ElementType,
    error::OptimisticError,
    game_state::GameState,
    player::{HandView, Side, MAX_BENCH_SIZE},
    type_chart,
};

fn ensure_in_progress(state: &GameState) -> Result<(), OptimisticError> {
    if state.is_finished() {
        return Err(OptimisticError::GameFinished);
    }
    Ok(())
}

/// Picks a random card to show while a real draw is in flight.
pub fn placeholder_card<R: Rng>(rng: &mut R) -> Card {
    let pool = [
        Card::new("", "Potion", 0, &[]),
        Card::new("", "Pikachu", 60, &[ElementType::Electric]).with_attack(Attack::new(
            "Thunder Shock",
            Damage::Fixed(20),
            &[ElementType::Electric],
        )),
        Card::new("", "Charmander", 50, &[ElementType::Fire]).with_attack(Attack::new(
            "Ember",
            Damage::Fixed(30),
            &[ElementType::Fire, ElementType::Colorless],
        )),
        Card::new("", "Squirtle", 50, &[ElementType::Water]).with_attack(Attack::new(
            "Water Gun",
            Damage::Fixed(20),
            &[ElementType::Water],
        )),
        Card::new("", "Bulbasaur", 60, &[ElementType::Grass]).with_attack(Attack::new(
            "Vine Whip",
            Damage::Fixed(20),
            &[ElementType::Grass],
        )),
    ];
    let mut card = pool
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| Card::new("", "Potion", 0, &[]));
    card.id = format!("drawn-{}", rng.gen::<u32>());
    card
}

pub fn apply_optimistic_draw(state: &GameState, card: Card) -> Result<GameState, OptimisticError> {
    ensure_in_progress(state)?;
    let mut next = state.clone();
    match &mut next.child_player.hand {
        HandView::Known { hand } => hand.push(card),
        HandView::Hidden { .. } => return Err(OptimisticError::HandHidden),
    }
    Ok(next)
}

/// Moves a card from hand to the active slot, or to the bench when a Pokemon is already active.
pub fn apply_optimistic_play(
    state: &GameState,
    card_id: &str,
) -> Result<GameState, OptimisticError> {
    ensure_in_progress(state)?;
    let mut next = state.clone();
    let player = &mut next.child_player;
    if player.active.is_some() && player.bench_is_full() {
        return Err(OptimisticError::BenchFull(MAX_BENCH_SIZE));
    }
    let hand = match &mut player.hand {
        HandView::Known { hand } => hand,
        HandView::Hidden { .. } => return Err(OptimisticError::HandHidden),
    };
    let idx = hand
        .iter()
        .position(|card| card.id == card_id)
        .ok_or_else(|| OptimisticError::CardNotInHand(card_id.to_string()))?;
    let card = hand.remove(idx);
    if player.active.is_none() {
        player.active = Some(card);
    } else {
        player.bench.push(card);
    }
    Ok(next)
}

/// Damage the child's attack at `attack_index` would deal: base damage scaled by type
/// effectiveness against the AI's active Pokemon, or plain base damage with no defender.
pub fn attack_damage(state: &GameState, attack_index: usize) -> Result<u32, OptimisticError> {
    let attacker = state
        .child_player
        .active
        .as_ref()
        .ok_or_else(|| OptimisticError::NoActivePokemon(Side::Child.to_string()))?;
    let attack = attacker
        .attacks
        .get(attack_index)
        .ok_or(OptimisticError::InvalidAttackIndex(attack_index))?;
    let defending = state.ai_player.active.as_ref().and_then(Card::primary_type);
    let effectiveness = match (attacker.primary_type(), defending) {
        (Some(attacking), Some(defending)) => type_chart::effectiveness(attacking, defending),
        _ => type_chart::Effectiveness::Normal,
    };
    let damage = effectiveness.apply(attack.damage.base_value());
    log::debug!("{} deals {} damage ({effectiveness})", attack.name, damage);
    Ok(damage)
}

/// Previews the child's active Pokemon hitting the AI's active Pokemon.
pub fn apply_optimistic_attack(
    state: &GameState,
    attack_index: usize,
) -> Result<GameState, OptimisticError> {
    ensure_in_progress(state)?;
    let damage = attack_damage(state, attack_index)?;
    let mut next = state.clone();
    let defender = next
        .ai_player
        .active
        .as_mut()
        .ok_or_else(|| OptimisticError::NoActivePokemon(Side::Ai.to_string()))?;
    defender.hp = defender.hp.saturating_sub(damage);
    Ok(next)
}

/// Swaps the child's active Pokemon with the one in `bench_index`.
pub fn apply_optimistic_retreat(
    state: &GameState,
    bench_index: usize,
) -> Result<GameState, OptimisticError> {
    ensure_in_progress(state)?;
    let mut next = state.clone();
    let player = &mut next.child_player;
    let active = player
        .active
        .take()
        .ok_or_else(|| OptimisticError::NoActivePokemon(Side::Child.to_string()))?;
    match player.bench.get_mut(bench_index) {
        Some(slot) => {
            let incoming = std::mem::replace(slot, active);
            player.active = Some(incoming);
            Ok(next)
        }
        None => Err(OptimisticError::InvalidBenchIndex(bench_index)),
    }
}
