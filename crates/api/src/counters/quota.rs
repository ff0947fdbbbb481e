//! Daily backend operation budget.
//!
//! A single counter key tallies every backend command the counters issue.
//! It gets a 24h TTL on the first charge of the day and is never cleared
//! explicitly: expiry is the only way back under budget.

use std::sync::Arc;

use crate::stores::KvStore;

pub const QUOTA_KEY: &str = "daily_cmd_count";
pub const QUOTA_TTL_SECS: u64 = 86_400;

/// Whether the backend may be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Configured and under budget.
    Available,
    /// Today's budget is spent.
    QuotaExceeded,
    /// No backend credentials were supplied.
    Unconfigured,
    /// The budget could not be read. Treated as available.
    Error,
}

impl Capability {
    pub fn allows_operations(self) -> bool {
        matches!(self, Capability::Available | Capability::Error)
    }
}

#[derive(Clone)]
pub struct QuotaGuard {
    store: Arc<dyn KvStore>,
    daily_budget: i64,
}

impl QuotaGuard {
    pub fn new(store: Arc<dyn KvStore>, daily_budget: i64) -> Self {
        Self {
            store,
            daily_budget,
        }
    }

    pub async fn capability(&self) -> Capability {
        match self.store.get(QUOTA_KEY).await {
            Ok(used) if used.unwrap_or(0) >= self.daily_budget => Capability::QuotaExceeded,
            Ok(_) => Capability::Available,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read daily budget, allowing");
                Capability::Error
            }
        }
    }

    /// True unless the counter is known to be at or over the budget.
    pub async fn has_budget(&self) -> bool {
        self.capability().await.allows_operations()
    }

    /// Add `cost` commands to today's tally. Never fails the caller.
    pub async fn charge(&self, cost: i64) {
        match self.store.incr_by(QUOTA_KEY, cost).await {
            // First charge since the key expired
            Ok(total) if total == cost => {
                if let Err(err) = self.store.expire(QUOTA_KEY, QUOTA_TTL_SECS).await {
                    tracing::warn!(error = %err, "failed to set daily budget expiry");
                }
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, cost, "failed to charge daily budget"),
        }
    }
}
