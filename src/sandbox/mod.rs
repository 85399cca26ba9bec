//! The sandbox: an ordered board of concept cards plus the generation calls that
//! fill it.
//!
//! Every mutation is a short synchronous critical section; generation calls run
//! with the lock released. Board changes are announced on the [`EventBus`] as
//! `CardAdded` / `CardUpdated` / `CardRemoved`.

pub mod board;

use async_trait::async_trait;
use futures::StreamExt;
use rand::seq::SliceRandom;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::auto::{Action, ActionKind, ActionRunner};
use crate::cards::{
    Card, CardId, CardPopulation, CardSnapshot, CardState, Concept, LoadingKind, Placement,
};
use crate::config::{Connections, SandboxConfig};
use crate::constants::DEFAULT_CREATE_PROMPTS;
use crate::error::AppError;
use crate::events::{EventBus, SandboxEvent};
use crate::generations::ConceptGenerator;
use board::Board;

const EVENT_SOURCE: &str = "sandbox";

pub struct Sandbox {
    board: Mutex<Board>,
    generator: Arc<dyn ConceptGenerator>,
    connections: RwLock<Connections>,
    create_prompts: Vec<String>,
    bus: EventBus,
}

impl Sandbox {
    pub fn new(generator: Arc<dyn ConceptGenerator>, connections: Connections, bus: EventBus) -> Self {
        Self {
            board: Mutex::new(Board::new()),
            generator,
            connections: RwLock::new(connections),
            create_prompts: DEFAULT_CREATE_PROMPTS.iter().map(|p| p.to_string()).collect(),
            bus,
        }
    }

    pub fn from_config(
        config: &SandboxConfig,
        generator: Arc<dyn ConceptGenerator>,
        bus: EventBus,
    ) -> Self {
        Self::new(generator, config.connections.clone(), bus)
            .with_create_prompts(config.create_prompts.clone())
    }

    pub fn with_create_prompts(mut self, prompts: Vec<String>) -> Self {
        let prompts: Vec<String> = prompts
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if !prompts.is_empty() {
            self.create_prompts = prompts;
        }
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn lock(&self) -> MutexGuard<'_, Board> {
        self.board.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: SandboxEvent) {
        self.bus.emit_event(event, EVENT_SOURCE);
    }

    // ========================
    // Connections
    // ========================

    pub fn connections(&self) -> Connections {
        self.connections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Merge non-blank values into the current connections
    pub fn set_connections(&self, update: &Connections) -> Connections {
        let mut current = self
            .connections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = current.merged(update);
        current.clone()
    }

    /// Whether prompts can be submitted (an API key is configured)
    pub fn creation_enabled(&self) -> bool {
        self.connections().has_api_key()
    }

    fn api_key(&self) -> Result<String, AppError> {
        let connections = self.connections();
        if !connections.has_api_key() {
            return Err(AppError::missing_api_key());
        }
        Ok(connections.gemini_api_key)
    }

    // ========================
    // Queries
    // ========================

    pub fn cards(&self) -> Vec<Card> {
        self.lock().cards().to_vec()
    }

    pub fn card(&self, id: &CardId) -> Option<Card> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().cards().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Card face labels in board order
    pub fn labels(&self) -> Vec<String> {
        self.lock().cards().iter().map(Card::label).collect()
    }

    // ========================
    // Board mutations
    // ========================

    fn insert_card(&self, state: CardState, placement: Placement) -> CardId {
        let id = {
            let mut board = self.lock();
            let card = board.new_card(state);
            let id = card.id.clone();
            board.insert(card, &placement);
            id
        };
        self.emit(SandboxEvent::CardAdded { card_id: id.clone() });
        id
    }

    pub(crate) fn set_card_state(&self, id: &CardId, state: CardState) -> bool {
        let updated = self.lock().set_state(id, state);
        if updated {
            self.emit(SandboxEvent::CardUpdated { card_id: id.clone() });
        }
        updated
    }

    /// Place an already generated concept on the board
    pub fn add_concept(&self, concept: Concept, placement: Placement) -> CardId {
        self.insert_card(CardState::Populated(concept), placement)
    }

    pub fn remove(&self, id: &CardId) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            self.emit(SandboxEvent::CardRemoved { card_id: id.clone() });
        }
        removed
    }

    pub fn remove_many(&self, ids: &[CardId]) -> usize {
        ids.iter().filter(|id| self.remove(id)).count()
    }

    /// Keep only the newest card of each concept name; returns how many were removed
    pub fn dedupe(&self) -> usize {
        let duplicates = self.lock().duplicates();
        self.remove_many(&duplicates)
    }

    /// Swap a split placeholder for a populated card followed by a fresh placeholder
    ///
    /// Returns `(new card, new placeholder)`, or `None` when the placeholder was
    /// removed while the split was running.
    fn fill_placeholder(&self, placeholder: &CardId, concept: Concept) -> Option<(CardId, CardId)> {
        let (card_id, next_placeholder) = {
            let mut board = self.lock();
            let card = board.new_card(CardState::Populated(concept));
            let card_id = card.id.clone();
            if !board.replace(placeholder, card) {
                return None;
            }
            let next = board.new_card(CardState::Placeholder);
            let next_id = next.id.clone();
            board.insert(next, &Placement::After(card_id.clone()));
            (card_id, next_id)
        };

        self.emit(SandboxEvent::CardRemoved {
            card_id: placeholder.clone(),
        });
        self.emit(SandboxEvent::CardAdded {
            card_id: card_id.clone(),
        });
        self.emit(SandboxEvent::CardAdded {
            card_id: next_placeholder.clone(),
        });
        Some((card_id, next_placeholder))
    }

    // ========================
    // Generation
    // ========================

    /// Create from user input; blank input is ignored
    pub async fn submit_prompt(&self, input: &str) -> Result<Option<CardId>, AppError> {
        let prompt = input.trim();
        if prompt.is_empty() {
            return Ok(None);
        }
        self.create_from_prompt(prompt).await.map(Some)
    }

    /// Append a loading card and fill it from a prompt
    ///
    /// Fails immediately without touching the board when no API key is set. If the
    /// call fails (or is dropped) the loading card is removed.
    pub async fn create_from_prompt(&self, prompt: &str) -> Result<CardId, AppError> {
        let api_key = self.api_key()?;
        let pending = PendingCard::new(
            self,
            self.insert_card(CardState::Loading(LoadingKind::Generating), Placement::End),
        );

        let concept = self.generator.create_concept(&api_key, prompt).await?;
        Ok(pending.populate(concept))
    }

    /// Mix the concepts of `sources` into a new card
    ///
    /// Sources that are missing or not yet populated are skipped; at least one must
    /// remain.
    pub async fn mix_cards(
        &self,
        sources: &[CardId],
        placement: Placement,
    ) -> Result<CardId, AppError> {
        let api_key = self.api_key()?;
        let concepts: Vec<Concept> = {
            let board = self.lock();
            sources
                .iter()
                .filter_map(|id| board.get(id).and_then(Card::concept).cloned())
                .collect()
        };
        if concepts.is_empty() {
            return Err(AppError::invalid_params("no populated source cards to mix"));
        }

        let pending = PendingCard::new(
            self,
            self.insert_card(CardState::Loading(LoadingKind::Mixing), placement),
        );

        let concept = self.generator.mix_concepts(&api_key, &concepts).await?;
        Ok(pending.populate(concept))
    }

    /// Drag-and-drop: mix `dragged` into `target`, placing the result after it
    ///
    /// Returns `Ok(None)` when nothing but the target itself was dropped.
    pub async fn drop_onto(
        &self,
        target: &CardId,
        dragged: &[CardId],
    ) -> Result<Option<CardId>, AppError> {
        if self.card(target).is_none() {
            return Err(AppError::card_not_found(target.to_string()));
        }
        let others: Vec<CardId> = {
            let board = self.lock();
            dragged
                .iter()
                .filter(|id| *id != target && board.get(id).is_some())
                .cloned()
                .collect()
        };
        if others.is_empty() {
            return Ok(None);
        }

        let mut sources = vec![target.clone()];
        sources.extend(others);
        self.mix_cards(&sources, Placement::After(target.clone()))
            .await
            .map(Some)
    }

    /// Split a card into the concepts it is made of
    ///
    /// Results stream in behind a "Splitting..." placeholder placed after the source
    /// card. The trailing placeholder is always removed, also on error. A card
    /// without a concept yields nothing.
    pub async fn split_card(&self, id: &CardId) -> Result<Vec<CardId>, AppError> {
        let api_key = self.api_key()?;
        let concept = match self.card(id) {
            Some(card) => match card.concept() {
                Some(concept) => concept.clone(),
                None => return Ok(Vec::new()),
            },
            None => return Err(AppError::card_not_found(id.to_string())),
        };

        let mut placeholder = PendingCard::new(
            self,
            self.insert_card(CardState::Placeholder, Placement::After(id.clone())),
        );
        let mut results = self.generator.split_concept(&api_key, &concept);
        let mut created = Vec::new();

        while let Some(result) = results.next().await {
            let concept = result?;
            let Some(current) = placeholder.id() else {
                break;
            };
            match self.fill_placeholder(&current, concept) {
                Some((card_id, next)) => {
                    created.push(card_id);
                    placeholder.rearm(next);
                }
                // Placeholder was removed from the board; nothing left to fill
                None => {
                    placeholder.disarm();
                    break;
                }
            }
        }

        Ok(created)
    }
}

/// A card that is removed again unless it gets populated
///
/// Covers failed calls and futures dropped mid-flight alike.
struct PendingCard<'a> {
    sandbox: &'a Sandbox,
    id: CardId,
    armed: bool,
}

impl<'a> PendingCard<'a> {
    fn new(sandbox: &'a Sandbox, id: CardId) -> Self {
        Self {
            sandbox,
            id,
            armed: true,
        }
    }

    fn id(&self) -> Option<CardId> {
        self.armed.then(|| self.id.clone())
    }

    fn rearm(&mut self, id: CardId) {
        self.id = id;
        self.armed = true;
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    fn populate(mut self, concept: Concept) -> CardId {
        self.armed = false;
        // A card removed while loading stays removed
        self.sandbox
            .set_card_state(&self.id, CardState::Populated(concept));
        self.id.clone()
    }
}

impl Drop for PendingCard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.sandbox.remove(&self.id);
        }
    }
}

impl CardPopulation for Sandbox {
    fn list_cards(&self) -> Vec<CardSnapshot> {
        self.lock().cards().iter().map(Card::snapshot).collect()
    }
}

#[async_trait]
impl ActionRunner for Sandbox {
    async fn run_action(&self, action: &Action) -> Result<(), AppError> {
        match action.kind {
            ActionKind::Create => {
                let prompt = self
                    .create_prompts
                    .choose(&mut rand::thread_rng())
                    .cloned()
                    .ok_or_else(|| AppError::config("no create prompts configured"))?;
                self.create_from_prompt(&prompt).await.map(|_| ())
            }
            ActionKind::Mix => self
                .mix_cards(&action.targets, Placement::End)
                .await
                .map(|_| ()),
            ActionKind::Split => {
                let target = action
                    .targets
                    .first()
                    .ok_or_else(|| AppError::invalid_params("split needs a target card"))?;
                self.split_card(target).await.map(|_| ())
            }
        }
    }

    fn remove_duplicates(&self) {
        self.dedupe();
    }
}
