use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::api::ErrorResponse;

/// Errors surfaced to callers.
///
/// Backend trouble and quota exhaustion never show up here: the counters
/// absorb them and answer with defaults. Only malformed input is rejected.
#[derive(Debug)]
pub enum AppError {
    /// Validation errors - safe to show
    Validation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                tracing::debug!(error = %msg, "rejected request");
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: msg })).into_response()
            }
        }
    }
}

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        Self::Validation(report.to_string().trim().to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garde::Validate;
    use http_body_util::BodyExt;
    use shared::api::HeartbeatPayload;

    async fn response_body(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn validation_error_returns_400_with_json_body() {
        let err = AppError::Validation("invalid sessionId".into());
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response_body(response).await,
            r#"{"error":"invalid sessionId"}"#
        );
    }

    #[tokio::test]
    async fn garde_report_names_the_field() {
        let report = HeartbeatPayload::default().validate().unwrap_err();
        let err: AppError = report.into();

        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response_body(response).await.contains("session_id"));
    }
}
