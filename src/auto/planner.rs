//! Picks the next auto-play action from the board and what is already running.
//!
//! Pure apart from the random source, so tests pass a seeded RNG.

use rand::Rng;

use super::tracker::ActiveActions;
use super::types::Action;
use crate::cards::CardSnapshot;

/// Plan with a freshly drawn strategy value
pub fn plan_action<R: Rng + ?Sized>(
    cards: &[CardSnapshot],
    active: &ActiveActions,
    rng: &mut R,
) -> Option<Action> {
    let strategy = rng.gen::<f64>();
    plan_action_with(cards, active, strategy, rng)
}

/// Plan the next action
///
/// - empty board: create
/// - no idle cards: nothing
/// - `strategy > 0.5` and two or more idle cards: the first pair not already being
///   mixed, falling through to a split when every pair is taken
/// - otherwise: the first idle card not already being split
pub fn plan_action_with<R: Rng + ?Sized>(
    cards: &[CardSnapshot],
    active: &ActiveActions,
    strategy: f64,
    rng: &mut R,
) -> Option<Action> {
    if cards.is_empty() {
        return Some(Action::create());
    }

    let idle: Vec<&CardSnapshot> = cards.iter().filter(|c| c.is_idle()).collect();
    if idle.is_empty() {
        return None;
    }

    if idle.len() >= 2 && strategy > 0.5 {
        if let Some(action) = find_mix(&idle, active, rng) {
            return Some(action);
        }
    }

    find_split(&idle, active, rng)
}

fn find_mix<R: Rng + ?Sized>(
    idle: &[&CardSnapshot],
    active: &ActiveActions,
    rng: &mut R,
) -> Option<Action> {
    let order = weighted_shuffle(idle, rng);
    for (i, first) in order.iter().enumerate() {
        for second in &order[i + 1..] {
            if !active.is_mixing(&first.id, &second.id) {
                return Some(Action::mix(first, second));
            }
        }
    }
    None
}

fn find_split<R: Rng + ?Sized>(
    idle: &[&CardSnapshot],
    active: &ActiveActions,
    rng: &mut R,
) -> Option<Action> {
    weighted_shuffle(idle, rng)
        .into_iter()
        .find(|card| !active.is_splitting(&card.id))
        .map(|card| Action::split(card))
}

/// Shuffle that favours later items: sort by `random * (index + 1)`, largest first
pub fn weighted_shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut keyed: Vec<(f64, &T)> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (rng.gen::<f64>() * (i as f64 + 1.0), item))
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    keyed.into_iter().map(|(_, item)| item.clone()).collect()
}
