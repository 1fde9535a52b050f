//! Route-level tests: request validation and error mapping through the
//! actual router.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use dashgen::config::{AppConfig, GenerationConfig, LlmConfig, ServerConfig, StoreConfig};
use dashgen::generation::types::DashboardConfig;
use dashgen::llm::{LlmError, LlmGateway};
use dashgen::shared::state::AppState;
use dashgen::store::{DashboardStore, StoreError};
use dashgen::build_router;

struct UnusedLlm;

#[async_trait]
impl LlmGateway for UnusedLlm {
    async fn complete(
        &self,
        _system_prompt: Option<&str>,
        _user_prompt: &str,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        panic!("no model call expected in these tests");
    }

    async fn complete_with_image(
        &self,
        _prompt: &str,
        _image_base64: &str,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        panic!("no model call expected in these tests");
    }
}

struct UnusedStore;

#[async_trait]
impl DashboardStore for UnusedStore {
    async fn create(&self, _config: &DashboardConfig, _name: &str) -> Result<String, StoreError> {
        unreachable!()
    }

    async fn update(&self, _id: &str, _config: &DashboardConfig) -> Result<String, StoreError> {
        unreachable!()
    }

    async fn get(&self, _id: &str) -> Result<DashboardConfig, StoreError> {
        unreachable!()
    }

    async fn delete(&self, _id: &str) -> Result<(bool, String), StoreError> {
        unreachable!()
    }

    async fn publish(&self, _id: &str) -> Result<(), StoreError> {
        unreachable!()
    }

    fn embed_url(&self, id: &str) -> String {
        format!("https://store.test/embed/dashboardsv3/{id}?o=0")
    }

    fn dashboard_url(&self, id: &str) -> String {
        format!("https://store.test/dashboardsv3/{id}")
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        llm: LlmConfig {
            base_url: "https://llm.test/v1".to_string(),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
        },
        store: StoreConfig {
            base_url: "https://store.test".to_string(),
            token: "test-token".to_string(),
            warehouse_id: "wh-1".to_string(),
            parent_path: "/Shared".to_string(),
        },
        generation: GenerationConfig {
            max_poll_attempts: 300,
            poll_interval_ms: 500,
        },
    }
}

fn app() -> axum::Router {
    let state = Arc::new(AppState::new(
        test_config(),
        Arc::new(UnusedLlm),
        Arc::new(UnusedStore),
    ));
    build_router(state)
}

#[tokio::test]
async fn health_endpoint_responds() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_prompt_is_a_bad_request() {
    let body = serde_json::json!({
        "prompt": "   ",
        "columns": ["a"],
        "dataset": {"name": "t", "displayName": "T", "queryLines": ["SELECT 1"]}
    });
    let response = app()
        .oneshot(
            Request::post("/api/generation")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_columns_are_a_bad_request() {
    let body = serde_json::json!({
        "prompt": "show revenue",
        "columns": [],
        "dataset": {"name": "t", "displayName": "T", "queryLines": ["SELECT 1"]}
    });
    let response = app()
        .oneshot(
            Request::post("/api/generation")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_session_poll_is_not_found() {
    let response = app()
        .oneshot(
            Request::get(format!("/api/generation/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refine_without_a_session_is_a_conflict() {
    let response = app()
        .oneshot(
            Request::post("/api/design/dash-1/refine")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"feedback": "darker"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
