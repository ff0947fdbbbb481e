//! Shared test utilities for counter and handler tests.
//!
//! `MockKvStore` (mockall) is the tool for asserting exact backend calls.
//! `MemoryKvStore` is a small stateful stand-in for scenario tests that need
//! counters and sorted sets to behave like the real thing.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::test_utils::{MemoryKvStore, TestStateBuilder};
//!
//! let store = Arc::new(MemoryKvStore::new());
//! let state = TestStateBuilder::new().with_store(store.clone()).build();
//! ```

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::{config::Config, counters::Counters, state::AppState, stores::KvStore};

/// Creates a test configuration with the production defaults.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        redis_url: None,
        redis_token: None,
        daily_budget: 8000,
        presence_window_secs: 120,
        request_timeout_ms: 3000,
        env: "test".to_string(),
        sentry_dsn: None,
    }
}

/// Counters over the given store with the test configuration.
pub fn counters_with(store: Arc<dyn KvStore>) -> Counters {
    Counters::new(Some(store), &test_config())
}

/// Counters with no backend configured.
pub fn unconfigured_counters() -> Counters {
    Counters::new(None, &test_config())
}

#[derive(Default)]
struct MemoryState {
    values: HashMap<String, i64>,
    ttls: HashMap<String, u64>,
    sorted_sets: HashMap<String, HashMap<String, f64>>,
}

/// In-memory `KvStore`. TTLs are recorded, not enforced; use `expire_now`.
#[derive(Default)]
pub struct MemoryKvStore {
    state: Mutex<MemoryState>,
    failing: AtomicBool,
    stalled: AtomicBool,
    stalled_increments: Mutex<HashSet<String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent call hang forever.
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    /// Make increments of `key` hang forever; everything else still answers.
    pub fn stall_increments(&self, key: &str) {
        self.stalled_increments
            .lock()
            .unwrap()
            .insert(key.to_string());
    }

    pub fn seed(&self, key: &str, value: i64) {
        self.state
            .lock()
            .unwrap()
            .values
            .insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Option<i64> {
        self.state.lock().unwrap().values.get(key).copied()
    }

    pub fn ttl(&self, key: &str) -> Option<u64> {
        self.state.lock().unwrap().ttls.get(key).copied()
    }

    /// Sorted set members, lowest score first.
    pub fn members(&self, key: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut members: Vec<(String, f64)> = state
            .sorted_sets
            .get(key)
            .map(|set| set.iter().map(|(m, s)| (m.clone(), *s)).collect())
            .unwrap_or_default();
        members.sort_by(|a, b| a.1.total_cmp(&b.1));
        members.into_iter().map(|(member, _)| member).collect()
    }

    /// Drop a key as if its TTL had elapsed.
    pub fn expire_now(&self, key: &str) {
        let mut state = self.state.lock().unwrap();
        state.values.remove(key);
        state.ttls.remove(key);
        state.sorted_sets.remove(key);
    }

    async fn gate(&self) -> Result<()> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            bail!("backend unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn ping(&self) -> Result<bool> {
        self.gate().await?;
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>> {
        self.gate().await?;
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: i64, ttl_secs: Option<u64>) -> Result<()> {
        self.gate().await?;
        let mut state = self.state.lock().unwrap();
        state.values.insert(key.to_string(), value);
        match ttl_secs {
            Some(ttl) => state.ttls.insert(key.to_string(), ttl),
            None => state.ttls.remove(key),
        };
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.gate().await?;
        let stalled = self.stalled_increments.lock().unwrap().contains(key);
        if stalled {
            std::future::pending::<()>().await;
        }
        let mut state = self.state.lock().unwrap();
        let value = state.values.entry(key.to_string()).or_insert(0);
        *value += delta;
        Ok(*value)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.incr_by(key, 1).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.gate().await?;
        let state = self.state.lock().unwrap();
        Ok(state.values.contains_key(key) || state.sorted_sets.contains_key(key))
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        self.gate().await?;
        let mut state = self.state.lock().unwrap();
        if state.values.contains_key(key) || state.sorted_sets.contains_key(key) {
            state.ttls.insert(key.to_string(), ttl_secs);
        }
        Ok(())
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        self.gate().await?;
        self.state
            .lock()
            .unwrap()
            .sorted_sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn zrembyscore(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        self.gate().await?;
        let mut state = self.state.lock().unwrap();
        let Some(set) = state.sorted_sets.get_mut(key) else {
            return Ok(0);
        };
        let before = set.len();
        set.retain(|_, score| *score < min || *score > max);
        let removed = (before - set.len()) as u64;
        if set.is_empty() {
            state.sorted_sets.remove(key);
        }
        Ok(removed)
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        self.gate().await?;
        let state = self.state.lock().unwrap();
        Ok(state.sorted_sets.get(key).map_or(0, |set| set.len() as u64))
    }
}

/// Builder for constructing test `AppState`.
///
/// Without a store the state runs in the unconfigured mode.
pub struct TestStateBuilder {
    config: Config,
    store: Option<Arc<dyn KvStore>>,
}

impl TestStateBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> AppState {
        AppState {
            counters: Counters::new(self.store, &self.config),
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
