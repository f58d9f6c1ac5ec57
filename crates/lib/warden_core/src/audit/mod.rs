// @zen-component: AGENT-ActionAuditor
//
//! Bounded, append-only log of agent tool invocations.

pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::models::agent::{ActionStats, AgentAction, NewAgentAction};
use crate::uuid::uuidv7;

pub use store::{ActionFilter, ActionStore, DEFAULT_CAPACITY, InMemoryActionStore};

/// Default page size for [`ActionLog::get_session_actions`].
pub const DEFAULT_SESSION_LIMIT: usize = 50;

/// Default page size for [`ActionLog::get_recent_actions`].
pub const DEFAULT_RECENT_LIMIT: usize = 100;

/// Action log facade over an [`ActionStore`].
#[derive(Clone)]
pub struct ActionLog {
    store: Arc<dyn ActionStore>,
}

impl ActionLog {
    pub fn new(store: Arc<dyn ActionStore>) -> Self {
        Self { store }
    }

    /// In-memory log with the default capacity.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryActionStore::new()))
    }

    /// Assign id and timestamp, then append.
    pub fn log_action(&self, action: NewAgentAction) -> AgentAction {
        let recorded = AgentAction {
            id: uuidv7().to_string(),
            timestamp: Utc::now(),
            session_id: action.session_id,
            tool_name: action.tool_name,
            input: action.input,
            output: action.output,
            success: action.success,
            duration_ms: action.duration_ms,
            user_id: action.user_id,
            ip_address: action.ip_address,
            error: action.error,
        };
        debug!(
            id = %recorded.id,
            session_id = %recorded.session_id,
            tool = %recorded.tool_name,
            success = recorded.success,
            duration_ms = recorded.duration_ms,
            "agent action recorded"
        );
        self.store.append(recorded.clone());
        recorded
    }

    /// Last `limit` actions of one session, oldest first.
    pub fn get_session_actions(&self, session_id: &str, limit: usize) -> Vec<AgentAction> {
        let filter = ActionFilter {
            session_id: Some(session_id),
            ..ActionFilter::default()
        };
        self.store.tail(filter, limit)
    }

    /// Last `limit` actions across all sessions, oldest first.
    pub fn get_recent_actions(&self, limit: usize) -> Vec<AgentAction> {
        self.store.tail(ActionFilter::default(), limit)
    }

    /// Last `limit` actions recorded for one user, optionally within one session.
    pub fn get_user_actions(
        &self,
        user_id: &str,
        session_id: Option<&str>,
        limit: usize,
    ) -> Vec<AgentAction> {
        let filter = ActionFilter {
            session_id,
            user_id: Some(user_id),
        };
        self.store.tail(filter, limit)
    }

    /// Aggregate statistics over the trailing hour and day.
    pub fn get_action_stats(&self) -> ActionStats {
        let now = Utc::now();
        let hour_ago = now - Duration::hours(1);
        let last_day = self.store.since(now - Duration::hours(24));

        let last_hour = last_day.iter().filter(|a| a.timestamp >= hour_ago).count();
        let successes = last_day.iter().filter(|a| a.success).count();

        let mut tool_usage: HashMap<String, usize> = HashMap::new();
        for action in &last_day {
            *tool_usage.entry(action.tool_name.clone()).or_default() += 1;
        }

        let (success_rate, avg_duration_ms) = if last_day.is_empty() {
            (0.0, 0.0)
        } else {
            let total_ms: u64 = last_day.iter().map(|a| a.duration_ms).sum();
            (
                successes as f64 / last_day.len() as f64 * 100.0,
                total_ms as f64 / last_day.len() as f64,
            )
        };

        ActionStats {
            total_actions: self.store.len(),
            last_hour,
            last_24_hours: last_day.len(),
            success_rate,
            tool_usage,
            avg_duration_ms,
        }
    }

    /// Empty the log. Callers gate access.
    pub fn clear_action_log(&self) {
        let dropped = self.store.len();
        self.store.clear();
        info!(dropped, "agent action log cleared");
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::in_memory()
    }
}
