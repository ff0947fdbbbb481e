//! User-submitted catch logs.
//!
//! Submissions are validated and written to the log for moderation; nothing is
//! stored or published by the API itself.
//!
//! ## Endpoints
//!
//! - POST /api/catch-report-ugc - Submit a catch log

use axum::{Json, Router, body::Bytes, debug_handler, response::IntoResponse, routing::post};
use chrono::Local;
use garde::Validate;
use shared::api::{CatchSubmissionPayload, CatchSubmissionResponse};

use crate::{error::AppError, handlers::parse_body, state::AppState};

const ACKNOWLEDGEMENT: &str = "Thanks for your report! It will appear once a moderator approves it.";

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(submit))
}

#[debug_handler(state = AppState)]
async fn submit(body: Bytes) -> Result<impl IntoResponse, AppError> {
    let payload: CatchSubmissionPayload = parse_body(&body);
    // Dates are calendar days where the server runs
    payload.validate_with(&Local::now().date_naive())?;

    tracing::info!(
        spot_slug = payload.spot_slug.as_deref().unwrap_or_default(),
        spot_name = payload.spot_name.as_deref().unwrap_or_default(),
        fish_name = payload.fish_name.as_deref().unwrap_or_default(),
        user_name = payload.user_name.as_deref().unwrap_or_default(),
        comment = payload.comment.as_deref().unwrap_or_default(),
        date = payload.date.as_deref().unwrap_or_default(),
        "catch submission received"
    );

    Ok(Json(CatchSubmissionResponse {
        ok: true,
        message: ACKNOWLEDGEMENT.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::Days;
    use tower::ServiceExt;

    async fn submit_json(body: String) -> StatusCode {
        let request = Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        router()
            .with_state(TestStateBuilder::new().build())
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    fn submission(date: &str, fish_name: &str) -> String {
        format!(
            r#"{{"spotSlug":"tokyo-bay-pier","spotName":"Tokyo Bay Pier","fishName":"{fish_name}","userName":"angler","comment":"Good tide","date":"{date}"}}"#
        )
    }

    #[tokio::test]
    async fn accepts_valid_submission() {
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();

        assert_eq!(submit_json(submission(&today, "Aji")).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_future_date() {
        let day_after_tomorrow = Local::now()
            .date_naive()
            .checked_add_days(Days::new(2))
            .unwrap()
            .format("%Y-%m-%d")
            .to_string();

        assert_eq!(
            submit_json(submission(&day_after_tomorrow, "Aji")).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn rejects_long_fish_name() {
        let fish = "f".repeat(31);

        assert_eq!(
            submit_json(submission("2024-05-01", &fish)).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn rejects_empty_body() {
        assert_eq!(submit_json(String::new()).await, StatusCode::BAD_REQUEST);
    }
}
