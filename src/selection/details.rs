use serde::Serialize;
use ts_rs::TS;

use crate::cards::CardId;
use crate::constants::{GENERATING_LABEL, PENDING_DESCRIPTION, PENDING_EMOJI, TIPS};
use crate::sandbox::Sandbox;

/// What the detail pane shows for the current selection
#[derive(Clone, Debug, PartialEq, Serialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DetailView {
    Tips {
        tips: Vec<String>,
    },
    Item {
        emoji: String,
        name: String,
        description: String,
    },
    Multiple {
        count: usize,
    },
}

impl DetailView {
    pub fn for_selection(ids: &[CardId], sandbox: &Sandbox) -> Self {
        match ids {
            [] => DetailView::Tips {
                tips: TIPS.iter().map(|t| t.to_string()).collect(),
            },
            [id] => {
                let concept = sandbox.card(id).and_then(|card| card.concept().cloned());
                match concept {
                    Some(concept) => DetailView::Item {
                        emoji: concept.emoji,
                        name: concept.name,
                        description: concept.description,
                    },
                    None => DetailView::Item {
                        emoji: PENDING_EMOJI.to_string(),
                        name: GENERATING_LABEL.to_string(),
                        description: PENDING_DESCRIPTION.to_string(),
                    },
                }
            }
            _ => DetailView::Multiple { count: ids.len() },
        }
    }
}
