use std::sync::Arc;

use shared::domain::ModelId;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

use crate::{
    history::{HistoryChange, NavigationAction, NavigationHistory},
    lifecycle::LifecycleController,
    model_selector::ModelSelector,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Restored,
    Unchanged,
    /// Current entry carries no complete `{requestData, responseData}` pair.
    NoPayload,
    NoEntry,
    OwnCommit,
}

/// Replays navigation-history state into the lifecycle controller. Only reads
/// entries and never submits, so its own pushes cannot loop back.
pub struct HistorySync {
    controller: Arc<LifecycleController>,
    history: Arc<dyn NavigationHistory>,
    selector: ModelSelector,
    changes: broadcast::Receiver<HistoryChange>,
}

impl HistorySync {
    /// Subscribes to `history` and applies its current entry as the initial
    /// mount.
    pub async fn mount(
        controller: Arc<LifecycleController>,
        history: Arc<dyn NavigationHistory>,
        selector: ModelSelector,
    ) -> Self {
        let changes = history.subscribe();
        let mut sync = Self {
            controller,
            history,
            selector,
            changes,
        };
        sync.apply_current().await;
        sync
    }

    pub fn model(&self) -> Option<&ModelId> {
        self.selector.current()
    }

    /// Handles every notification queued so far and returns how many were seen.
    pub async fn sync_pending(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.changes.try_recv() {
                Ok(change) => {
                    self.apply_change(&change).await;
                    handled += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "history sync lagged; resyncing from current entry");
                    self.apply_current().await;
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return handled,
            }
        }
    }

    /// Follows history changes until the history is dropped.
    pub async fn run(mut self) {
        loop {
            match self.changes.recv().await {
                Ok(change) => {
                    self.apply_change(&change).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "history sync lagged; resyncing from current entry");
                    self.apply_current().await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    /// Applies one notification. The push this view's controller made for its
    /// own commit is skipped: the controller already holds that pair and may
    /// have started a newer request since.
    pub async fn apply_change(&mut self, change: &HistoryChange) -> SyncOutcome {
        debug!(index = change.index, action = ?change.action, "history change");
        if change.action == NavigationAction::Push
            && self.controller.is_own_commit(change.entry.id).await
        {
            return SyncOutcome::OwnCommit;
        }
        self.apply_current().await
    }

    pub async fn apply_current(&mut self) -> SyncOutcome {
        let Some(entry) = self.history.current().await else {
            return SyncOutcome::NoEntry;
        };

        self.selector.observe(&entry.route, &self.controller).await;

        let Some((request, response)) = entry.state.as_ref().and_then(|state| state.pair())
        else {
            return SyncOutcome::NoPayload;
        };

        if self
            .controller
            .restore(request.clone(), response.clone())
            .await
        {
            debug!(route = %entry.route, model = %request.model, "restored annotation from history");
            SyncOutcome::Restored
        } else {
            SyncOutcome::Unchanged
        }
    }
}

#[cfg(test)]
#[path = "tests/history_sync_tests.rs"]
mod tests;
