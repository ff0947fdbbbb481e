//! Shared API request/response types for the presence and catch-report endpoints.
//!
//! Request payloads keep every field optional so that a missing or mistyped
//! field surfaces as a validation failure (400) rather than a deserialization
//! rejection. Lengths are counted in UTF-16 code units, as browsers count them.

use chrono::NaiveDate;
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Max session id length accepted by the presence heartbeat.
pub const MAX_PRESENCE_SESSION_LEN: usize = 50;
/// Max session id length accepted by catch reports (dedup guard keys).
pub const MAX_REPORT_SESSION_LEN: usize = 60;
/// Max entity (spot) identifier length.
pub const MAX_ENTITY_ID_LEN: usize = 100;

const MAX_FISH_NAME_LEN: usize = 30;
const MAX_USER_NAME_LEN: usize = 20;
const MAX_COMMENT_LEN: usize = 100;

/// Heartbeat sent by an open browser tab.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatPayload {
    #[garde(required, length(utf16, min = 1, max = MAX_PRESENCE_SESSION_LEN))]
    pub session_id: Option<String>,
}

/// Response to a heartbeat. `ok` is always true: presence never fails the caller.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeartbeatResponse {
    pub ok: bool,
    pub count: u64,
}

/// Generic `{ count }` response used by the read endpoints.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountResponse {
    pub count: u64,
}

/// Query string for reading a spot's catch count.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CatchCountQuery {
    #[serde(alias = "spot")]
    #[garde(required, length(utf16, min = 1, max = MAX_ENTITY_ID_LEN))]
    pub entity_id: Option<String>,
}

/// "I caught something here" report, limited to one per session per spot per day.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CatchReportPayload {
    #[serde(alias = "spotSlug")]
    #[garde(required, length(utf16, min = 1, max = MAX_ENTITY_ID_LEN))]
    pub entity_id: Option<String>,
    #[garde(required, length(utf16, min = 1, max = MAX_REPORT_SESSION_LEN))]
    pub session_id: Option<String>,
}

/// Error code returned when a session already reported for a spot today.
pub const ALREADY_REPORTED: &str = "already_reported";

/// Response to a catch report. `error` is only set when the report was not accepted.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatchReportResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub count: u64,
}

impl CatchReportResponse {
    pub fn accepted(count: u64) -> Self {
        Self {
            ok: true,
            error: None,
            count,
        }
    }

    pub fn already_reported(count: u64) -> Self {
        Self {
            ok: false,
            error: Some(ALREADY_REPORTED.to_string()),
            count,
        }
    }
}

/// User-submitted catch log, queued for moderation. Validated against today's date.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[garde(context(NaiveDate))]
pub struct CatchSubmissionPayload {
    #[garde(required, length(utf16, min = 1, max = MAX_ENTITY_ID_LEN))]
    pub spot_slug: Option<String>,
    #[garde(skip)]
    pub spot_name: Option<String>,
    #[garde(required, length(utf16, min = 1, max = MAX_FISH_NAME_LEN))]
    pub fish_name: Option<String>,
    #[garde(required, length(utf16, min = 1, max = MAX_USER_NAME_LEN))]
    pub user_name: Option<String>,
    #[garde(required, length(utf16, min = 1, max = MAX_COMMENT_LEN))]
    pub comment: Option<String>,
    /// Catch date as `YYYY-MM-DD`; may not be after today.
    #[garde(custom(validate_catch_date))]
    pub date: Option<String>,
}

fn validate_catch_date(value: &Option<String>, today: &NaiveDate) -> garde::Result {
    let Some(raw) = value else {
        return Err(garde::Error::new("date is required"));
    };
    if raw.len() != 10 {
        return Err(garde::Error::new("date must be formatted as YYYY-MM-DD"));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| garde::Error::new("date must be formatted as YYYY-MM-DD"))?;
    if date > *today {
        return Err(garde::Error::new("date cannot be in the future"));
    }
    Ok(())
}

/// Acknowledgement for a catch submission.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatchSubmissionResponse {
    pub ok: bool,
    pub message: String,
}

/// Body of every 400 response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
