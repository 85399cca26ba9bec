use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cards::{CardId, CardSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    Create,
    Mix,
    Split,
}

/// One auto-play step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Action {
    pub id: Uuid,
    pub kind: ActionKind,
    pub targets: Vec<CardId>,
    pub description: String,
}

impl Action {
    pub fn create() -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ActionKind::Create,
            targets: Vec::new(),
            description: "Create initial concept".to_string(),
        }
    }

    pub fn mix(first: &CardSnapshot, second: &CardSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ActionKind::Mix,
            targets: vec![first.id.clone(), second.id.clone()],
            description: format!("Mix {} + {}", first.display_name(), second.display_name()),
        }
    }

    pub fn split(card: &CardSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ActionKind::Split,
            targets: vec![card.id.clone()],
            description: format!("Split {}", card.display_name()),
        }
    }
}

/// Order-independent key for a pair of cards
pub fn pair_key(a: &CardId, b: &CardId) -> String {
    if a <= b {
        format!("{}+{}", a, b)
    } else {
        format!("{}+{}", b, a)
    }
}
