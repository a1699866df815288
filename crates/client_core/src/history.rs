//! Navigation history: an append-only log of `{route, state}` entries with a
//! back/forward cursor.

use std::collections::VecDeque;

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{EntryId, Route},
    protocol::{HistoryPayload, NavigationEntry},
};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

pub const DEFAULT_HISTORY_CAPACITY: usize = 256;
const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAction {
    Push,
    Back,
    Forward,
}

#[derive(Debug, Clone)]
pub struct HistoryChange {
    pub action: NavigationAction,
    pub index: usize,
    pub entry: NavigationEntry,
}

/// Position and identity of an entry written through `push_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedEntry {
    pub index: usize,
    pub id: EntryId,
}

/// What the lifecycle core needs from a navigation stack: append an entry at the
/// current route, read the current entry, and observe changes to it.
#[async_trait]
pub trait NavigationHistory: Send + Sync {
    async fn push_state(&self, state: HistoryPayload) -> Result<CommittedEntry>;
    async fn current(&self) -> Option<NavigationEntry>;
    fn subscribe(&self) -> broadcast::Receiver<HistoryChange>;
}

struct HistoryStack {
    entries: VecDeque<NavigationEntry>,
    cursor: usize,
}

impl HistoryStack {
    fn current(&self) -> Option<&NavigationEntry> {
        self.entries.get(self.cursor)
    }
}

/// Browser-like history kept in memory. Pushing after going back drops the
/// forward entries; once `capacity` is exceeded the oldest entry is evicted.
pub struct InMemoryHistory {
    stack: Mutex<HistoryStack>,
    capacity: usize,
    changes: broadcast::Sender<HistoryChange>,
}

impl InMemoryHistory {
    pub fn new(initial: Route) -> Self {
        Self::with_capacity(initial, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(initial: Route, capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let mut entries = VecDeque::new();
        entries.push_back(NavigationEntry::new(initial, None));
        Self {
            stack: Mutex::new(HistoryStack { entries, cursor: 0 }),
            capacity: capacity.max(1),
            changes,
        }
    }

    /// User-driven navigation to a new location without attached state.
    pub async fn push_route(&self, route: Route) -> usize {
        self.push_entry(NavigationEntry::new(route, None)).await
    }

    pub async fn back(&self) -> Option<NavigationEntry> {
        self.step(NavigationAction::Back).await
    }

    pub async fn forward(&self) -> Option<NavigationEntry> {
        self.step(NavigationAction::Forward).await
    }

    pub async fn entries(&self) -> Vec<NavigationEntry> {
        self.stack.lock().await.entries.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.stack.lock().await.entries.len()
    }

    pub async fn position(&self) -> usize {
        self.stack.lock().await.cursor
    }

    pub async fn current_route(&self) -> Option<Route> {
        self.stack
            .lock()
            .await
            .current()
            .map(|entry| entry.route.clone())
    }

    async fn push_entry(&self, entry: NavigationEntry) -> usize {
        let mut stack = self.stack.lock().await;
        let keep = stack.cursor + 1;
        stack.entries.truncate(keep);
        stack.entries.push_back(entry.clone());
        while stack.entries.len() > self.capacity {
            stack.entries.pop_front();
        }
        stack.cursor = stack.entries.len() - 1;
        let index = stack.cursor;
        debug!(index, route = %entry.route, has_state = entry.state.is_some(), "history push");
        let _ = self.changes.send(HistoryChange {
            action: NavigationAction::Push,
            index,
            entry,
        });
        index
    }

    async fn step(&self, action: NavigationAction) -> Option<NavigationEntry> {
        let mut stack = self.stack.lock().await;
        let target = match action {
            NavigationAction::Back => stack.cursor.checked_sub(1)?,
            NavigationAction::Forward if stack.cursor + 1 < stack.entries.len() => {
                stack.cursor + 1
            }
            _ => return None,
        };
        stack.cursor = target;
        let entry = stack.current()?.clone();
        debug!(index = target, route = %entry.route, ?action, "history step");
        let _ = self.changes.send(HistoryChange {
            action,
            index: target,
            entry: entry.clone(),
        });
        Some(entry)
    }
}

#[async_trait]
impl NavigationHistory for InMemoryHistory {
    async fn push_state(&self, state: HistoryPayload) -> Result<CommittedEntry> {
        let route = self.current_route().await.unwrap_or_else(Route::root);
        let entry = NavigationEntry::new(route, Some(state));
        let id = entry.id;
        let index = self.push_entry(entry).await;
        Ok(CommittedEntry { index, id })
    }

    async fn current(&self) -> Option<NavigationEntry> {
        self.stack.lock().await.current().cloned()
    }

    fn subscribe(&self) -> broadcast::Receiver<HistoryChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
