use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed client request.
    #[error("{0}")]
    Validation(String),

    #[error("Database error")]
    Storage(#[from] sqlx::Error),

    /// The MQTT client refused to queue a message.
    #[error("Failed to publish control command")]
    Bus(#[source] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(msg) => {
                warn!(reason = %msg, "Rejected request");
                StatusCode::BAD_REQUEST
            }
            AppError::Storage(e) => {
                error!(error = %e, "Database query failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Bus(e) => {
                error!(error = %e, "MQTT publish failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
