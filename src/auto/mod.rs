//! Auto-play: a periodic scheduler that keeps the board busy on its own.

pub mod planner;
pub mod player;
pub mod tracker;
pub mod types;

use async_trait::async_trait;

use crate::error::AppError;

pub use planner::{plan_action, plan_action_with, weighted_shuffle};
pub use player::AutoPlayer;
pub use tracker::{ActionGuard, ActionTracker, ActiveActions};
pub use types::{pair_key, Action, ActionKind};

/// Carries out planned actions against a board
#[async_trait]
pub trait ActionRunner: Send + Sync {
    async fn run_action(&self, action: &Action) -> Result<(), AppError>;

    /// Called after each settled action when dedupe is enabled
    fn remove_duplicates(&self) {}
}
