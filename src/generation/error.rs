use axum::{response::IntoResponse, Json};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("LLM contract violation: {0}")]
    LlmContract(String),
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::LlmContract(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
