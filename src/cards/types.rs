//! Card and concept types shared by the board, the scheduler and the selection

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::constants::{
    CARD_ID_ALPHABET, CARD_ID_LENGTH, GENERATING_LABEL, MIXING_LABEL, SPLITTING_LABEL,
};

/// A concept produced by the generation service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Concept {
    pub name: String,
    pub description: String,
    pub emoji: String,
}

impl Concept {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        emoji: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            emoji: emoji.into(),
        }
    }
}

/// Unique card identifier (8 base62 characters)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct CardId(String);

impl CardId {
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..CARD_ID_LENGTH)
            .map(|_| CARD_ID_ALPHABET[rng.gen_range(0..CARD_ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CardId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an unpopulated card is waiting for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum LoadingKind {
    Generating,
    Mixing,
}

/// Card lifecycle state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CardState {
    Loading(LoadingKind),
    Populated(Concept),
    /// Stand-in for a split result that has not streamed in yet
    Placeholder,
}

/// A card on the board
#[derive(Clone, Debug)]
pub struct Card {
    pub id: CardId,
    /// Generation order; placeholders have none
    pub index: Option<u64>,
    pub state: CardState,
}

impl Card {
    pub fn concept(&self) -> Option<&Concept> {
        match &self.state {
            CardState::Populated(concept) => Some(concept),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.state, CardState::Placeholder)
    }

    /// Text shown on the card face
    pub fn label(&self) -> String {
        match &self.state {
            CardState::Loading(LoadingKind::Generating) => GENERATING_LABEL.to_string(),
            CardState::Loading(LoadingKind::Mixing) => MIXING_LABEL.to_string(),
            CardState::Placeholder => SPLITTING_LABEL.to_string(),
            CardState::Populated(concept) => format!("{} {}", concept.emoji, concept.name),
        }
    }

    pub fn snapshot(&self) -> CardSnapshot {
        let status = match &self.state {
            CardState::Loading(kind) => CardStatus::Loading(*kind),
            CardState::Populated(_) => CardStatus::Populated,
            CardState::Placeholder => CardStatus::Placeholder,
        };
        CardSnapshot {
            id: self.id.clone(),
            index: self.index,
            status,
            name: self.concept().map(|c| c.name.clone()),
        }
    }
}

/// Card status as seen by the scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "loading", rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum CardStatus {
    Loading(LoadingKind),
    Populated,
    Placeholder,
}

/// Read-only view of a card
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CardSnapshot {
    pub id: CardId,
    #[ts(type = "number | null")]
    pub index: Option<u64>,
    pub status: CardStatus,
    pub name: Option<String>,
}

impl CardSnapshot {
    /// Idle cards are neither loading nor placeholders
    pub fn is_idle(&self) -> bool {
        self.status == CardStatus::Populated
    }

    /// Name used in action descriptions
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Where a mixed card lands on the board
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    End,
    After(CardId),
}
