use std::collections::HashMap;

use crate::cards::{Card, CardId, CardState, Placement};

/// Ordered card population
///
/// Plain data: no events, no locking. [`super::Sandbox`] wraps it.
#[derive(Debug, Default)]
pub struct Board {
    cards: Vec<Card>,
    next_index: u64,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| &c.id == id)
    }

    pub fn position(&self, id: &CardId) -> Option<usize> {
        self.cards.iter().position(|c| &c.id == id)
    }

    /// Build a card with a fresh id; placeholders get no generation index
    pub fn new_card(&mut self, state: CardState) -> Card {
        let index = if matches!(state, CardState::Placeholder) {
            None
        } else {
            let index = self.next_index;
            self.next_index += 1;
            Some(index)
        };
        Card {
            id: CardId::random(),
            index,
            state,
        }
    }

    /// Insert a card; `After` an unknown card falls back to the end
    pub fn insert(&mut self, card: Card, placement: &Placement) {
        let position = match placement {
            Placement::End => None,
            Placement::After(anchor) => self.position(anchor).map(|p| p + 1),
        };
        match position {
            Some(p) => self.cards.insert(p, card),
            None => self.cards.push(card),
        }
    }

    pub fn set_state(&mut self, id: &CardId, state: CardState) -> bool {
        match self.cards.iter_mut().find(|c| &c.id == id) {
            Some(card) => {
                card.state = state;
                true
            }
            None => false,
        }
    }

    /// Put `card` where `id` was; returns false if `id` is gone
    pub fn replace(&mut self, id: &CardId, card: Card) -> bool {
        match self.position(id) {
            Some(p) => {
                self.cards[p] = card;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &CardId) -> Option<Card> {
        self.position(id).map(|p| self.cards.remove(p))
    }

    /// Ids of populated cards whose concept name already appears on a newer card
    pub fn duplicates(&self) -> Vec<CardId> {
        let mut groups: HashMap<&str, Vec<&Card>> = HashMap::new();
        for card in &self.cards {
            if let Some(concept) = card.concept() {
                groups.entry(concept.name.as_str()).or_default().push(card);
            }
        }

        let mut duplicates = Vec::new();
        for mut group in groups.into_values() {
            if group.len() > 1 {
                group.sort_by(|a, b| b.index.unwrap_or(0).cmp(&a.index.unwrap_or(0)));
                duplicates.extend(group.into_iter().skip(1).map(|c| c.id.clone()));
            }
        }
        duplicates
    }
}
