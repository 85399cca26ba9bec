use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::planner::plan_action;
use super::tracker::{ActionTracker, ActiveActions};
use super::types::Action;
use super::ActionRunner;
use crate::cards::CardPopulation;
use crate::config::AutoConfig;
use crate::events::{EventBus, SandboxEvent};

const EVENT_SOURCE: &str = "auto";

/// Periodic auto-play scheduler
///
/// While enabled, every poll interval it plans one action against the current
/// board and dispatches it on its own task, as long as fewer than
/// `max_concurrent` actions are in flight. Switching it off stops planning but
/// lets in-flight actions finish.
pub struct AutoPlayer<T> {
    target: Arc<T>,
    config: AutoConfig,
    tracker: ActionTracker,
    slots: Arc<Semaphore>,
    enabled: watch::Sender<bool>,
    rng: Mutex<StdRng>,
    bus: EventBus,
}

impl<T> AutoPlayer<T>
where
    T: CardPopulation + ActionRunner + 'static,
{
    pub fn new(target: Arc<T>, config: AutoConfig, bus: EventBus) -> Self {
        let max_concurrent = config.max_concurrent.max(1);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (enabled, _) = watch::channel(false);
        Self {
            target,
            config: AutoConfig {
                max_concurrent,
                ..config
            },
            tracker: ActionTracker::new(),
            slots: Arc::new(Semaphore::new(max_concurrent)),
            enabled,
            rng: Mutex::new(rng),
            bus,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.config.max_concurrent
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.borrow()
    }

    pub fn subscribe_enabled(&self) -> watch::Receiver<bool> {
        self.enabled.subscribe()
    }

    /// Flip auto-play; returns the new state
    pub fn toggle(&self) -> bool {
        let enabled = !self.is_enabled();
        self.set_enabled(enabled);
        enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        let changed = self.enabled.send_if_modified(|current| {
            if *current == enabled {
                return false;
            }
            *current = enabled;
            true
        });
        if changed {
            info!("Auto-play {}", if enabled { "enabled" } else { "disabled" });
            self.bus
                .emit_event(SandboxEvent::AutoToggled { enabled }, EVENT_SOURCE);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn active_actions(&self) -> ActiveActions {
        self.tracker.snapshot()
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Plan and dispatch at most one action
    ///
    /// Returns the dispatched action, or `None` when the concurrency cap is
    /// reached or there is nothing to do. Must be called inside a tokio runtime.
    pub fn tick(&self) -> Option<Action> {
        let permit = match self.slots.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!(in_flight = self.in_flight(), "Concurrency cap reached, skipping tick");
                return None;
            }
        };

        let cards = self.target.list_cards();
        let active = self.tracker.snapshot();
        let planned = {
            let mut rng = self.lock_rng();
            plan_action(&cards, &active, &mut *rng)
        };
        let Some(action) = planned else {
            debug!(cards = cards.len(), in_flight = active.len(), "Nothing to do this tick");
            return None;
        };
        let guard = self.tracker.register(&action)?;

        info!(action_id = %action.id, kind = ?action.kind, "{}", action.description);
        self.bus.emit_event(
            SandboxEvent::ActionStarted {
                action_id: action.id,
                kind: action.kind,
                description: action.description.clone(),
            },
            EVENT_SOURCE,
        );

        let target = self.target.clone();
        let bus = self.bus.clone();
        let dedupe = self.config.dedupe_after_action;
        let running = action.clone();
        tokio::spawn(async move {
            let result = target.run_action(&running).await;
            drop(guard);

            let error = match result {
                Ok(()) => {
                    debug!(action_id = %running.id, "Action finished");
                    None
                }
                Err(e) => {
                    warn!(action_id = %running.id, "Action '{}' failed: {}", running.description, e);
                    Some(e.to_string())
                }
            };
            bus.emit_event(
                SandboxEvent::ActionSettled {
                    action_id: running.id,
                    kind: running.kind,
                    succeeded: error.is_none(),
                    error,
                },
                EVENT_SOURCE,
            );

            if dedupe {
                target.remove_duplicates();
            }
            drop(permit);
        });

        Some(action)
    }

    /// Wait until every in-flight action has settled
    pub async fn drain(&self) {
        let _all = self
            .slots
            .acquire_many(self.config.max_concurrent as u32)
            .await;
    }

    /// Run the polling loop on its own task
    ///
    /// The loop idles while auto-play is disabled; abort the handle to stop it.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(self.clone().run())
    }

    async fn run(self: Arc<Self>) {
        let mut enabled = self.enabled.subscribe();
        loop {
            loop {
                let on = *enabled.borrow_and_update();
                if on {
                    break;
                }
                if enabled.changed().await.is_err() {
                    return;
                }
            }

            let mut ticker = tokio::time::interval(self.config.poll_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.tick();
                    }
                    changed = enabled.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        let on = *enabled.borrow_and_update();
                        if !on {
                            break;
                        }
                    }
                }
            }
        }
    }
}
