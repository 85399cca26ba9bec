use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::auto::ActionKind;
use crate::cards::CardId;

/// What happened in the sandbox
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SandboxEvent {
    CardAdded { card_id: CardId },
    CardUpdated { card_id: CardId },
    CardRemoved { card_id: CardId },
    AutoToggled { enabled: bool },
    ActionStarted {
        action_id: Uuid,
        kind: ActionKind,
        description: String,
    },
    ActionSettled {
        action_id: Uuid,
        kind: ActionKind,
        succeeded: bool,
        error: Option<String>,
    },
}

/// System event for the event bus
#[derive(Clone, Debug, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SystemEvent {
    pub event: SandboxEvent,
    pub timestamp: String,
    pub source: String,
}

impl SystemEvent {
    pub fn new(event: SandboxEvent, source: &str) -> Self {
        Self {
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
            source: source.to_string(),
        }
    }
}
