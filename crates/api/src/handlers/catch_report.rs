//! Per-spot "I caught something here" counter.
//!
//! Each session may report a spot once a day. Reports are never refused for
//! backend reasons: if the counter cannot be updated the report is
//! acknowledged with a count of 0.
//!
//! ## Endpoints
//!
//! - GET /api/catch-report?entityId={id} - Current count for a spot (`spot` also accepted)
//! - POST /api/catch-report - Report a catch

use axum::{
    Json, Router,
    body::Bytes,
    debug_handler,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
    routing::get,
};
use garde::Validate;
use shared::api::{CatchCountQuery, CatchReportPayload, CatchReportResponse, CountResponse};

use crate::{
    counters::ReportOutcome, error::AppError, handlers::parse_body, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_count).post(report))
}

#[debug_handler]
async fn get_count(
    State(state): State<AppState>,
    query: Result<Query<CatchCountQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    query.validate()?;
    let entity_id = query.entity_id.unwrap_or_default();

    let count = state.counters.engagement.get_count(&entity_id).await;

    Ok(Json(CountResponse { count }))
}

#[debug_handler]
async fn report(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: CatchReportPayload = parse_body(&body);
    payload.validate()?;
    let entity_id = payload.entity_id.unwrap_or_default();
    let session_id = payload.session_id.unwrap_or_default();

    let response = match state
        .counters
        .engagement
        .report(&entity_id, &session_id)
        .await
    {
        ReportOutcome::Accepted { count } => CatchReportResponse::accepted(count),
        ReportOutcome::AlreadyReported { count } => CatchReportResponse::already_reported(count),
    };

    Ok(Json(response))
}
