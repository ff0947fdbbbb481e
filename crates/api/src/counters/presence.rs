//! Approximate count of concurrently active sessions.
//!
//! Sessions live in one sorted set scored by their last heartbeat (ms). Counting
//! is a range delete of everything older than the window followed by a
//! cardinality read, so nothing needs a per-session expiry or a sweeper.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{Charged, MeteredStore};

pub const PRESENCE_KEY: &str = "active_users";

/// zadd + zrembyscore + zcard + budget charge
const HEARTBEAT_COST: i64 = 4;
/// zrembyscore + zcard + budget charge
const READ_COST: i64 = 3;

#[derive(Clone)]
pub struct PresenceTracker {
    backend: MeteredStore,
    window: Duration,
}

impl PresenceTracker {
    pub fn new(backend: MeteredStore, window: Duration) -> Self {
        Self { backend, window }
    }

    /// Scores at or below this are outside the window.
    fn cutoff(&self, now: DateTime<Utc>) -> f64 {
        let window_ms = i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX);
        now.timestamp_millis().saturating_sub(window_ms) as f64
    }

    /// Record a heartbeat for `session_id` and return the active count.
    /// Returns 0 when the backend is unusable.
    pub async fn heartbeat(&self, session_id: &str, now: DateTime<Utc>) -> u64 {
        let score = now.timestamp_millis() as f64;
        let cutoff = self.cutoff(now);

        self.backend
            .run("presence.heartbeat", 0, |store| async move {
                store.zadd(PRESENCE_KEY, session_id, score).await?;
                store
                    .zrembyscore(PRESENCE_KEY, f64::NEG_INFINITY, cutoff)
                    .await?;
                let count = store.zcard(PRESENCE_KEY).await?;
                Ok(Charged::new(count, HEARTBEAT_COST))
            })
            .await
    }

    /// Active count without registering a session.
    pub async fn current_count(&self, now: DateTime<Utc>) -> u64 {
        let cutoff = self.cutoff(now);

        self.backend
            .run("presence.count", 0, |store| async move {
                store
                    .zrembyscore(PRESENCE_KEY, f64::NEG_INFINITY, cutoff)
                    .await?;
                let count = store.zcard(PRESENCE_KEY).await?;
                Ok(Charged::new(count, READ_COST))
            })
            .await
    }
}
