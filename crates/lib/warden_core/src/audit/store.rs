//! Storage seam for the agent action log.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::models::agent::AgentAction;

/// Default number of actions retained.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Which actions an [`ActionStore::tail`] slice covers. `None` fields match anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionFilter<'a> {
    pub session_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
}

impl ActionFilter<'_> {
    pub fn matches(&self, action: &AgentAction) -> bool {
        self.session_id.is_none_or(|sid| action.session_id == sid)
            && self
                .user_id
                .is_none_or(|uid| action.user_id.as_deref() == Some(uid))
    }
}

/// Append-only, size-bounded action storage.
///
/// Slices are returned in insertion order (oldest first).
pub trait ActionStore: Send + Sync {
    /// Append an action, dropping the oldest entries beyond capacity.
    fn append(&self, action: AgentAction);

    /// Last `limit` actions that match `filter`.
    fn tail(&self, filter: ActionFilter<'_>, limit: usize) -> Vec<AgentAction>;

    /// All actions with `timestamp >= since`.
    fn since(&self, since: DateTime<Utc>) -> Vec<AgentAction>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);
}

/// Mutex-guarded ring of actions.
#[derive(Debug)]
pub struct InMemoryActionStore {
    entries: Mutex<VecDeque<AgentAction>>,
    capacity: usize,
}

impl InMemoryActionStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AgentAction>> {
        // A poisoned log is still a valid log: entries are only ever pushed whole.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryActionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionStore for InMemoryActionStore {
    fn append(&self, action: AgentAction) {
        let mut entries = self.lock();
        entries.push_back(action);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    fn tail(&self, filter: ActionFilter<'_>, limit: usize) -> Vec<AgentAction> {
        let entries = self.lock();
        let mut picked: Vec<AgentAction> = entries
            .iter()
            .rev()
            .filter(|a| filter.matches(a))
            .take(limit)
            .cloned()
            .collect();
        picked.reverse();
        picked
    }

    fn since(&self, since: DateTime<Utc>) -> Vec<AgentAction> {
        self.lock()
            .iter()
            .filter(|a| a.timestamp >= since)
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn clear(&self) {
        self.lock().clear();
    }
}
