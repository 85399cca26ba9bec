pub mod types;

pub use types::*;

/// Card population query consumed by the auto-player
pub trait CardPopulation: Send + Sync {
    /// All cards in board order
    fn list_cards(&self) -> Vec<CardSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(state: CardState) -> Card {
        Card {
            id: CardId::from("card0001"),
            index: Some(0),
            state,
        }
    }

    #[test]
    fn test_random_ids_are_base62() {
        let id = CardId::random();
        assert_eq!(id.as_str().len(), 8);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(CardId::random(), CardId::random());
    }

    #[test]
    fn test_labels_follow_state() {
        assert_eq!(card(CardState::Loading(LoadingKind::Generating)).label(), "Generating...");
        assert_eq!(card(CardState::Loading(LoadingKind::Mixing)).label(), "Mixing...");
        assert_eq!(card(CardState::Placeholder).label(), "Splitting...");
        let fire = Concept::new("Fire", "Hot.", "🔥");
        assert_eq!(card(CardState::Populated(fire)).label(), "🔥 Fire");
    }

    #[test]
    fn test_only_populated_cards_are_idle() {
        assert!(!card(CardState::Loading(LoadingKind::Mixing)).snapshot().is_idle());
        assert!(!card(CardState::Placeholder).snapshot().is_idle());

        let snapshot = card(CardState::Populated(Concept::new("Air", "Breath.", "💨"))).snapshot();
        assert!(snapshot.is_idle());
        assert_eq!(snapshot.display_name(), "Air");
    }
}
