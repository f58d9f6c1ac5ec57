// @zen-component: AGENT-SensitiveRateLimit
//
//! Fixed-window rate limiting for sensitive tool invocations.
//!
//! Windows reset lazily: a key whose window has passed starts a fresh window
//! the next time it is touched. [`InMemoryRateLimitStore::purge_expired`]
//! only reclaims memory for keys nobody touched again.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Default number of sensitive operations allowed per window.
pub const DEFAULT_MAX_SENSITIVE_OPS: u32 = 5;

/// Default window length: one minute.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
}

/// Counter key: one window per `(session, tool)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub session_id: String,
    pub tool_name: String,
}

impl RateLimitKey {
    pub fn new(session_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            tool_name: tool_name.into(),
        }
    }
}

/// Backing store for fixed-window counters.
///
/// `hit` must check and increment atomically per key so the count never
/// exceeds `max_ops` inside a window.
pub trait RateLimitStore: Send + Sync {
    fn hit(
        &self,
        key: &RateLimitKey,
        max_ops: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateLimitDecision;
}

#[derive(Debug, Clone)]
struct WindowCounter {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// In-memory counter map keyed by [`RateLimitKey`].
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    counters: DashMap<RateLimitKey, WindowCounter>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop counters whose window has already ended.
    pub fn purge_expired(&self, now: DateTime<Utc>) {
        self.counters.retain(|_, counter| now <= counter.reset_at);
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Spawn a periodic purge task.
    pub fn spawn_purge_task(
        self: &std::sync::Arc<Self>,
        every: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let store = std::sync::Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                store.purge_expired(Utc::now());
            }
        })
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn hit(
        &self,
        key: &RateLimitKey,
        max_ops: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
        let reset_at = now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC);

        // The entry guard holds the shard lock for the whole check-and-increment.
        let mut counter = self
            .counters
            .entry(key.clone())
            .or_insert_with(|| WindowCounter { count: 0, reset_at });

        if now > counter.reset_at {
            counter.count = 0;
            counter.reset_at = reset_at;
        }

        if counter.count >= max_ops {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
            };
        }

        counter.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: max_ops - counter.count,
        }
    }
}
