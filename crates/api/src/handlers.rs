//! HTTP endpoints.
//!
//! - **health** - liveness, no backend I/O
//! - **presence** - active visitor heartbeat and count
//! - **catch_report** - per-spot "caught something" counter
//! - **catch_submission** - user-submitted catch logs for moderation

use axum::body::Bytes;
use serde::de::DeserializeOwned;

pub mod catch_report;
pub mod catch_submission;
pub mod health;
pub mod presence;

/// Parse a JSON body, treating anything unparsable as an empty payload.
///
/// Validation then rejects the missing fields with a 400, which is what
/// clients expect for a mistyped field too.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "unparsable request body");
        T::default()
    })
}
