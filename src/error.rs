use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::wizard::ConfiguratorError;

/// Errors surfaced by the HTTP handlers. Responses carry `{ "error": ... }`
/// and never include provider or internal details.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Email service is not configured")]
    NotConfigured,

    #[error("Email delivery failed: {0}")]
    Delivery(String),

    #[error(transparent)]
    Configurator(#[from] ConfiguratorError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotConfigured => {
                tracing::error!("EMAIL_API_KEY is not set; refusing form submission");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ApiError::Delivery(msg) => {
                tracing::error!("Email delivery failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "Failed to send message".into())
            }
            ApiError::Configurator(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
