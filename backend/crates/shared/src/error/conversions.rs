//! Error conversions
//!
//! Renders [`AppError`] as the JSON error body every endpoint returns.

use super::app_error::AppError;

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

/// Body shape: `{"error": <message>, "kind": <KIND>, "action": <hint|null>}`.
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::json!({
            "error": self.message(),
            "kind": self.kind(),
            "action": self.action(),
        });

        (status, Json(body)).into_response()
    }
}
