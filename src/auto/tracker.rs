use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::types::{pair_key, Action, ActionKind};
use crate::cards::CardId;

/// Actions currently in flight, indexed the way the planner asks about them
#[derive(Debug, Default, Clone)]
pub struct ActiveActions {
    in_flight: Vec<Action>,
    splitting: HashSet<CardId>,
    mixing: HashSet<String>,
}

impl ActiveActions {
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn actions(&self) -> &[Action] {
        &self.in_flight
    }

    pub fn is_splitting(&self, card: &CardId) -> bool {
        self.splitting.contains(card)
    }

    pub fn is_mixing(&self, a: &CardId, b: &CardId) -> bool {
        self.mixing.contains(&pair_key(a, b))
    }

    /// Whether `action` would double up on cards already being worked on
    pub fn conflicts(&self, action: &Action) -> bool {
        match (action.kind, action.targets.as_slice()) {
            (ActionKind::Split, [card, ..]) => self.is_splitting(card),
            (ActionKind::Mix, [a, b, ..]) => self.is_mixing(a, b),
            _ => false,
        }
    }

    /// Record `action`; refuses (returns false) on conflict
    pub fn register(&mut self, action: &Action) -> bool {
        if self.conflicts(action) {
            return false;
        }
        match (action.kind, action.targets.as_slice()) {
            (ActionKind::Split, [card, ..]) => {
                self.splitting.insert(card.clone());
            }
            (ActionKind::Mix, [a, b, ..]) => {
                self.mixing.insert(pair_key(a, b));
            }
            _ => {}
        }
        self.in_flight.push(action.clone());
        true
    }

    pub fn release(&mut self, action_id: Uuid) -> Option<Action> {
        let position = self.in_flight.iter().position(|a| a.id == action_id)?;
        let action = self.in_flight.remove(position);
        match (action.kind, action.targets.as_slice()) {
            (ActionKind::Split, [card, ..]) => {
                self.splitting.remove(card);
            }
            (ActionKind::Mix, [a, b, ..]) => {
                self.mixing.remove(&pair_key(a, b));
            }
            _ => {}
        }
        Some(action)
    }
}

/// Shared handle onto [`ActiveActions`]
#[derive(Clone, Default)]
pub struct ActionTracker {
    inner: Arc<Mutex<ActiveActions>>,
}

impl ActionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ActiveActions> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ActiveActions {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Register `action`; it stays registered until the guard is dropped
    pub fn register(&self, action: &Action) -> Option<ActionGuard> {
        if !self.lock().register(action) {
            return None;
        }
        Some(ActionGuard {
            tracker: self.clone(),
            action_id: action.id,
        })
    }
}

/// Deregisters its action on drop, whether the action succeeded, failed or panicked
pub struct ActionGuard {
    tracker: ActionTracker,
    action_id: Uuid,
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.tracker.lock().release(self.action_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardSnapshot, CardStatus};

    fn idle(id: &str) -> CardSnapshot {
        CardSnapshot {
            id: CardId::from(id),
            index: Some(0),
            status: CardStatus::Populated,
            name: Some(id.to_string()),
        }
    }

    #[test]
    fn test_mix_pairs_are_unordered() {
        let mut active = ActiveActions::default();
        assert!(active.register(&Action::mix(&idle("a"), &idle("b"))));

        assert!(active.is_mixing(&CardId::from("b"), &CardId::from("a")));
        assert!(active.conflicts(&Action::mix(&idle("b"), &idle("a"))));
        assert!(!active.register(&Action::mix(&idle("b"), &idle("a"))));
        assert!(active.register(&Action::mix(&idle("a"), &idle("c"))));
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn test_one_split_per_card() {
        let mut active = ActiveActions::default();
        assert!(active.register(&Action::split(&idle("a"))));
        assert!(!active.register(&Action::split(&idle("a"))));
        assert!(active.register(&Action::split(&idle("b"))));
    }

    #[test]
    fn test_creates_never_conflict() {
        let mut active = ActiveActions::default();
        assert!(active.register(&Action::create()));
        assert!(active.register(&Action::create()));
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn test_release_restores_previous_state() {
        let mut active = ActiveActions::default();
        let split = Action::split(&idle("a"));
        let mix = Action::mix(&idle("a"), &idle("b"));
        active.register(&split);
        active.register(&mix);

        assert_eq!(active.release(mix.id).unwrap().id, mix.id);
        assert!(!active.is_mixing(&CardId::from("a"), &CardId::from("b")));
        assert!(active.is_splitting(&CardId::from("a")));

        active.release(split.id);
        assert!(active.is_empty());
        assert!(!active.is_splitting(&CardId::from("a")));
        assert!(active.release(split.id).is_none());
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let tracker = ActionTracker::new();
        let action = Action::split(&idle("a"));

        let guard = tracker.register(&action).unwrap();
        assert_eq!(tracker.len(), 1);
        assert!(tracker.register(&action).is_none());

        drop(guard);
        assert!(tracker.is_empty());
        assert!(!tracker.snapshot().is_splitting(&CardId::from("a")));
    }
}
