use axum::{response::IntoResponse, Json};

use crate::llm::LlmError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DesignError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("No design session for dashboard {0}; request a proposal first")]
    NoActiveSession(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Design model returned an unusable theme: {0}")]
    Contract(String),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for DesignError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::NoActiveSession(_) => (StatusCode::CONFLICT, self.to_string()),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Contract(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            Self::Llm(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            Self::Store(StoreError::Api { status: 404, message }) => {
                (StatusCode::NOT_FOUND, message.clone())
            }
            Self::Store(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
