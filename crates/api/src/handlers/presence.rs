//! Active visitor count.
//!
//! Each open tab posts a heartbeat roughly every 60 seconds; a session counts
//! as active while its latest heartbeat is inside the presence window.
//!
//! ## Endpoints
//!
//! - GET /api/presence - Current active count
//! - POST /api/presence - Heartbeat, returns the active count including the caller

use axum::{
    Json, Router, body::Bytes, debug_handler, extract::State, response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use garde::Validate;
use shared::api::{CountResponse, HeartbeatPayload, HeartbeatResponse};

use crate::{error::AppError, handlers::parse_body, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_count).post(heartbeat))
}

#[debug_handler]
async fn get_count(State(state): State<AppState>) -> impl IntoResponse {
    let count = state.counters.presence.current_count(Utc::now()).await;

    Json(CountResponse { count })
}

#[debug_handler]
async fn heartbeat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: HeartbeatPayload = parse_body(&body);
    payload.validate()?;
    let session_id = payload.session_id.unwrap_or_default();

    let count = state
        .counters
        .presence
        .heartbeat(&session_id, Utc::now())
        .await;

    Ok(Json(HeartbeatResponse { ok: true, count }))
}
