//! Selected cards, published to whoever renders details or enables remove buttons.

pub mod details;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cards::CardId;
use crate::events::SandboxEvent;
use crate::sandbox::Sandbox;

pub use details::DetailView;

/// Current selection over a [`Sandbox`]
///
/// Subscribers receive the selected ids in board order after every change.
pub struct Selection {
    sandbox: Arc<Sandbox>,
    selected: Mutex<HashSet<CardId>>,
    sender: watch::Sender<Vec<CardId>>,
}

impl Selection {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self {
            sandbox,
            selected: Mutex::new(HashSet::new()),
            sender,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<CardId>> {
        self.selected.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Selected ids in board order
    pub fn selected(&self) -> Vec<CardId> {
        let selected = self.lock();
        self.sandbox
            .cards()
            .into_iter()
            .map(|card| card.id)
            .filter(|id| selected.contains(id))
            .collect()
    }

    pub fn has_selection(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<CardId>> {
        self.sender.subscribe()
    }

    pub fn details(&self) -> DetailView {
        DetailView::for_selection(&self.selected(), &self.sandbox)
    }

    fn publish(&self) {
        self.sender.send_replace(self.selected());
    }

    /// Apply a click
    ///
    /// `target` is the clicked card, `None` for the background. `multi` is the
    /// ctrl/cmd modifier.
    pub fn click(&self, target: Option<&CardId>, multi: bool) {
        {
            let mut selected = self.lock();
            match (target, multi) {
                (None, false) => selected.clear(),
                (None, true) => return,
                (Some(id), true) => {
                    if !selected.remove(id) {
                        selected.insert(id.clone());
                    }
                }
                (Some(id), false) => {
                    selected.clear();
                    selected.insert(id.clone());
                }
            }
        }
        self.publish();
    }

    pub fn clear(&self) {
        self.click(None, false);
    }

    /// Remove every selected card from the board
    pub fn remove_selected(&self) -> usize {
        let ids: Vec<CardId> = self.lock().drain().collect();
        let removed = self.sandbox.remove_many(&ids);
        self.publish();
        removed
    }

    /// Remove every card that is not selected
    pub fn remove_others(&self) -> usize {
        let others: Vec<CardId> = {
            let selected = self.lock();
            self.sandbox
                .cards()
                .into_iter()
                .map(|card| card.id)
                .filter(|id| !selected.contains(id))
                .collect()
        };
        self.sandbox.remove_many(&others)
    }

    /// Keep the selection consistent with a board change
    pub fn handle_event(&self, event: &SandboxEvent) {
        match event {
            SandboxEvent::CardRemoved { card_id } => {
                if self.lock().remove(card_id) {
                    self.publish();
                }
            }
            SandboxEvent::CardUpdated { card_id } => {
                if self.lock().contains(card_id) {
                    self.publish();
                }
            }
            _ => {}
        }
    }

    /// Drop ids that are no longer on the board
    fn resync(&self) {
        let on_board: HashSet<CardId> = self.sandbox.cards().into_iter().map(|c| c.id).collect();
        self.lock().retain(|id| on_board.contains(id));
        self.publish();
    }

    /// Follow board events on a background task until the handle is aborted
    pub fn listen(self: Arc<Self>) -> JoinHandle<()> {
        let mut events = self.sandbox.bus().subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.handle_event(&event.event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Selection listener lagged by {} events, resyncing", skipped);
                        self.resync();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardState, Concept, LoadingKind, Placement};
    use crate::config::Connections;
    use crate::events::EventBus;
    use crate::generations::testing::ScriptedGenerator;

    fn board(names: &[&str]) -> (Arc<Sandbox>, Vec<CardId>) {
        let sandbox = Arc::new(Sandbox::new(
            Arc::new(ScriptedGenerator::new()),
            Connections::default(),
            EventBus::new(),
        ));
        let ids = names
            .iter()
            .map(|name| sandbox.add_concept(Concept::new(*name, "d", "e"), Placement::End))
            .collect();
        (sandbox, ids)
    }

    #[test]
    fn test_click_semantics() {
        let (sandbox, ids) = board(&["A", "B", "C"]);
        let selection = Selection::new(sandbox);

        selection.click(Some(&ids[0]), false);
        assert_eq!(selection.selected(), vec![ids[0].clone()]);

        selection.click(Some(&ids[2]), true);
        selection.click(Some(&ids[1]), true);
        assert_eq!(selection.selected(), ids);

        // Modifier click on a selected card deselects it
        selection.click(Some(&ids[1]), true);
        assert_eq!(selection.selected(), vec![ids[0].clone(), ids[2].clone()]);

        // Modifier click on the background keeps the selection
        selection.click(None, true);
        assert!(selection.has_selection());

        selection.click(Some(&ids[1]), false);
        assert_eq!(selection.selected(), vec![ids[1].clone()]);

        selection.click(None, false);
        assert!(!selection.has_selection());
    }

    #[test]
    fn test_subscribers_see_board_order() {
        let (sandbox, ids) = board(&["A", "B", "C"]);
        let selection = Selection::new(sandbox);
        let mut rx = selection.subscribe();

        selection.click(Some(&ids[2]), true);
        selection.click(Some(&ids[0]), true);

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), vec![ids[0].clone(), ids[2].clone()]);
        assert_eq!(
            selection.details(),
            DetailView::Multiple { count: 2 }
        );
    }

    #[test]
    fn test_remove_selected_and_others() {
        let (sandbox, ids) = board(&["A", "B", "C", "D"]);
        let selection = Selection::new(sandbox.clone());

        selection.click(Some(&ids[1]), true);
        selection.click(Some(&ids[2]), true);
        assert_eq!(selection.remove_others(), 2);
        assert_eq!(sandbox.labels(), vec!["e B".to_string(), "e C".to_string()]);
        assert_eq!(selection.selected().len(), 2);

        assert_eq!(selection.remove_selected(), 2);
        assert!(sandbox.is_empty());
        assert!(!selection.has_selection());
        assert_eq!(selection.details(), DetailView::for_selection(&[], &sandbox));
    }

    #[test]
    fn test_handle_event_prunes_and_republishes() {
        let (sandbox, ids) = board(&["A", "B"]);
        let selection = Selection::new(sandbox.clone());
        selection.click(Some(&ids[0]), true);
        selection.click(Some(&ids[1]), true);
        let mut rx = selection.subscribe();
        rx.borrow_and_update();

        sandbox.set_card_state(&ids[0], CardState::Loading(LoadingKind::Generating));
        selection.handle_event(&SandboxEvent::CardUpdated {
            card_id: ids[0].clone(),
        });
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        // Updates to unselected cards are ignored
        selection.handle_event(&SandboxEvent::CardUpdated {
            card_id: CardId::from("other000"),
        });
        assert!(!rx.has_changed().unwrap());

        sandbox.remove(&ids[0]);
        selection.handle_event(&SandboxEvent::CardRemoved {
            card_id: ids[0].clone(),
        });
        assert_eq!(*rx.borrow_and_update(), vec![ids[1].clone()]);
    }

    #[tokio::test]
    async fn test_listener_follows_board_removals() {
        let (sandbox, ids) = board(&["A", "B"]);
        let selection = Arc::new(Selection::new(sandbox.clone()));
        let handle = selection.clone().listen();
        selection.click(Some(&ids[0]), false);
        let mut rx = selection.subscribe();
        rx.borrow_and_update();

        sandbox.remove(&ids[0]);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_empty());
        assert!(!selection.has_selection());

        handle.abort();
    }
}
