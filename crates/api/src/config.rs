use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Backend URL (e.g., rediss://example.upstash.io:6379). Unset disables the counters.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Backend credential token, sent as the AUTH password.
    #[serde(default)]
    pub redis_token: Option<String>,
    /// Backend commands allowed per day before the counters go quiet.
    #[serde(default = "default_daily_budget")]
    pub daily_budget: i64,
    /// Trailing window a heartbeat keeps a session counted as active.
    /// Keep it at least twice the client heartbeat interval.
    #[serde(default = "default_presence_window_secs")]
    pub presence_window_secs: u64,
    /// Deadline for all backend work done by a single request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Set to "production" for JSON logging, anything else for human-readable.
    #[serde(default)]
    pub env: String,
    /// Sentry DSN for error tracking
    #[serde(default)]
    pub sentry_dsn: Option<String>,
}

/// Connection details for a configured backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub url: String,
    pub token: String,
}

fn default_daily_budget() -> i64 {
    8000
}

fn default_presence_window_secs() -> u64 {
    120
}

fn default_request_timeout_ms() -> u64 {
    3000
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    /// Backend settings, or `None` when either the URL or token is blank.
    ///
    /// Values are trimmed: pasted secrets often carry a trailing newline.
    pub fn backend(&self) -> Option<BackendSettings> {
        let url = self.redis_url.as_deref().map(str::trim).unwrap_or_default();
        let token = self.redis_token.as_deref().map(str::trim).unwrap_or_default();

        if url.is_empty() || token.is_empty() {
            return None;
        }

        Some(BackendSettings {
            url: url.to_string(),
            token: token.to_string(),
        })
    }

    pub fn presence_window(&self) -> Duration {
        Duration::from_secs(self.presence_window_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
