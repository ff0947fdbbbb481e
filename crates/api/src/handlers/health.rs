//! Health check endpoint for load balancers and monitoring.
//!
//! Always 200 while the process serves requests. The backend is reported but
//! not contacted: probes would otherwise spend the daily command budget.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        backend: if state.counters.is_configured() {
            "configured"
        } else {
            "unconfigured"
        },
    })
}
