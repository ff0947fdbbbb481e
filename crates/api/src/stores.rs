//! Backend key-value store (Redis).
//!
//! The counters only ever talk to the backend through [`KvStore`]. When no
//! backend is configured there is no store at all; see `counters::MeteredStore`.
//!
//! ## Redis Key Patterns
//!
//! ```text
//! active_users                         → Sorted set of session ids (score = last heartbeat ms)
//! catch:{entity_id}                    → Lifetime catch report count
//! catch_limit:{session_id}:{entity_id} → Dedup guard (24h TTL)
//! daily_cmd_count                      → Backend commands issued today (24h TTL)
//! ```

mod kv;

pub use kv::{KvStore, RedisKvStore};

#[cfg(test)]
pub use kv::MockKvStore;
