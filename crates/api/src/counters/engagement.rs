//! Per-spot catch counters with a once-per-day-per-session guard.
//!
//! The guard is checked before the increment and written after it. Two
//! simultaneous reports from one session can therefore both be counted; that
//! double count is tolerated instead of wrapping the sequence in a transaction.

use super::{Charged, MeteredStore, to_count};

pub const DEDUP_TTL_SECS: u64 = 86_400;

/// get + budget charge
const COUNT_READ_COST: i64 = 2;
/// exists + incr + set + budget read and charge
const REPORT_COST: i64 = 5;
/// exists + get + budget charge
const DUPLICATE_REPORT_COST: i64 = 3;

/// What happened to a catch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Counted (or silently dropped because the backend is unusable).
    Accepted { count: u64 },
    /// This session already reported this spot today. `count` is unchanged.
    AlreadyReported { count: u64 },
}

#[derive(Clone)]
pub struct EngagementCounter {
    backend: MeteredStore,
}

impl EngagementCounter {
    pub fn new(backend: MeteredStore) -> Self {
        Self { backend }
    }

    fn count_key(entity_id: &str) -> String {
        format!("catch:{}", entity_id)
    }

    fn guard_key(session_id: &str, entity_id: &str) -> String {
        format!("catch_limit:{}:{}", session_id, entity_id)
    }

    /// Lifetime report count for `entity_id`, 0 when unknown or unavailable.
    pub async fn get_count(&self, entity_id: &str) -> u64 {
        let key = Self::count_key(entity_id);

        self.backend
            .run("engagement.count", 0, |store| async move {
                let count = store.get(&key).await?.unwrap_or(0);
                Ok(Charged::new(to_count(count), COUNT_READ_COST))
            })
            .await
    }

    /// Count one catch for `entity_id` unless `session_id` already did today.
    ///
    /// An unusable backend yields `Accepted { count: 0 }` so the visitor's
    /// action still succeeds.
    pub async fn report(&self, entity_id: &str, session_id: &str) -> ReportOutcome {
        let key = Self::count_key(entity_id);
        let guard = Self::guard_key(session_id, entity_id);

        self.backend
            .run(
                "engagement.report",
                ReportOutcome::Accepted { count: 0 },
                |store| async move {
                    if store.exists(&guard).await? {
                        let count = store.get(&key).await?.unwrap_or(0);
                        return Ok(Charged::new(
                            ReportOutcome::AlreadyReported {
                                count: to_count(count),
                            },
                            DUPLICATE_REPORT_COST,
                        ));
                    }

                    let count = store.incr(&key).await?;
                    store.set(&guard, 1, Some(DEDUP_TTL_SECS)).await?;

                    Ok(Charged::new(
                        ReportOutcome::Accepted {
                            count: to_count(count),
                        },
                        REPORT_COST,
                    ))
                },
            )
            .await
    }
}
