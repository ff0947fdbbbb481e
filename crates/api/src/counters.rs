//! Best-effort presence and catch counters on a quota-limited backend.
//!
//! Every backend interaction goes through [`MeteredStore::run`], which:
//!
//! 1. short-circuits to the fallback when no backend is configured,
//! 2. consults the [`QuotaGuard`] and short-circuits once today's budget is spent,
//! 3. runs the operation under the request deadline,
//! 4. charges the budget with the cost it reports, under a separate deadline
//!    that can delay but never discard the result.
//!
//! Failures never reach the caller. They are logged and replaced by the fallback.
//!
//! ## Usage in Handlers
//!
//! ```ignore
//! let count = state.counters.presence.heartbeat(&session_id, Utc::now()).await;
//! let outcome = state.counters.engagement.report(&entity_id, &session_id).await;
//! ```

mod engagement;
mod presence;
mod quota;

pub use engagement::{EngagementCounter, ReportOutcome};
pub use presence::PresenceTracker;
pub use quota::{Capability, QuotaGuard};

use std::{future::Future, sync::Arc, time::Duration};

use anyhow::{Result, anyhow};

use crate::{config::Config, stores::KvStore};

/// An operation's result together with the number of backend commands it spent.
pub struct Charged<T> {
    pub value: T,
    pub cost: i64,
}

impl<T> Charged<T> {
    pub fn new(value: T, cost: i64) -> Self {
        Self { value, cost }
    }
}

/// Result of a one-off backend check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendStatus {
    pub reachable: bool,
    pub within_budget: bool,
}

#[derive(Clone)]
struct Connected {
    store: Arc<dyn KvStore>,
    quota: QuotaGuard,
}

/// Backend handle shared by the trackers. `None` inside means "not configured".
#[derive(Clone)]
pub struct MeteredStore {
    backend: Option<Connected>,
    deadline: Duration,
}

impl MeteredStore {
    pub fn new(store: Option<Arc<dyn KvStore>>, daily_budget: i64, deadline: Duration) -> Self {
        let backend = store.map(|store| Connected {
            quota: QuotaGuard::new(store.clone(), daily_budget),
            store,
        });

        Self { backend, deadline }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn capability(&self) -> Capability {
        match &self.backend {
            Some(backend) => backend.quota.capability().await,
            None => Capability::Unconfigured,
        }
    }

    /// Run `op` if the backend is usable, returning `fallback` otherwise.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, fallback: T, op: F) -> T
    where
        F: FnOnce(Arc<dyn KvStore>) -> Fut,
        Fut: Future<Output = Result<Charged<T>>>,
    {
        let work = async move {
            let capability = self.capability().await;
            if !capability.allows_operations() {
                tracing::debug!(operation, ?capability, "skipping backend operation");
                return None;
            }
            let backend = self.backend.as_ref()?;

            match op(backend.store.clone()).await {
                Ok(charged) => Some((backend, charged)),
                Err(err) => {
                    tracing::warn!(operation, error = %err, "backend operation failed");
                    sentry::capture_error(
                        err.as_ref() as &(dyn std::error::Error + Send + Sync + 'static)
                    );
                    None
                }
            }
        };

        let (backend, Charged { value, cost }) = match tokio::time::timeout(self.deadline, work).await
        {
            Ok(Some(done)) => done,
            Ok(None) => return fallback,
            Err(_) => {
                tracing::warn!(
                    operation,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "backend deadline exceeded"
                );
                return fallback;
            }
        };

        // The result stands whatever happens to the charge
        if tokio::time::timeout(self.deadline, backend.quota.charge(cost))
            .await
            .is_err()
        {
            tracing::warn!(operation, cost, "daily budget charge timed out");
        }

        value
    }

    /// Ping the backend and read the budget, for operators.
    pub async fn check(&self) -> Result<BackendStatus> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| anyhow!("backend not configured"))?;

        let status = async {
            let reachable = backend.store.ping().await?;
            let within_budget = backend.quota.has_budget().await;
            Ok::<_, anyhow::Error>(BackendStatus {
                reachable,
                within_budget,
            })
        };

        tokio::time::timeout(self.deadline, status)
            .await
            .map_err(|_| anyhow!("backend did not answer within {:?}", self.deadline))?
    }
}

/// The two counters, sharing one metered backend.
#[derive(Clone)]
pub struct Counters {
    pub presence: PresenceTracker,
    pub engagement: EngagementCounter,
    backend: MeteredStore,
}

impl Counters {
    pub fn new(store: Option<Arc<dyn KvStore>>, config: &Config) -> Self {
        let backend = MeteredStore::new(store, config.daily_budget, config.request_timeout());

        Self {
            presence: PresenceTracker::new(backend.clone(), config.presence_window()),
            engagement: EngagementCounter::new(backend.clone()),
            backend,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_configured()
    }

    pub async fn check(&self) -> Result<BackendStatus> {
        self.backend.check().await
    }
}

/// Clamp a backend integer to a non-negative count.
fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
