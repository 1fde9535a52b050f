//! Design infusion workflow tests: proposal, refinement, validation and the
//! immediate image path, against scripted doubles.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use dashgen::design::error::DesignError;
use dashgen::design::DesignEngine;
use dashgen::generation::types::{DashboardConfig, DataSourceSpec, GridRect, LayoutItem};
use dashgen::llm::{LlmError, LlmGateway};
use dashgen::store::{DashboardStore, StoreError};

/// Returns queued responses in order, then repeats the last one.
struct QueuedLlm {
    responses: Mutex<Vec<String>>,
}

impl QueuedLlm {
    fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }

    async fn next(&self) -> String {
        let mut responses = self.responses.lock().await;
        if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses[0].clone()
        }
    }
}

#[async_trait]
impl LlmGateway for QueuedLlm {
    async fn complete(
        &self,
        _system_prompt: Option<&str>,
        _user_prompt: &str,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        Ok(self.next().await)
    }

    async fn complete_with_image(
        &self,
        _prompt: &str,
        _image_base64: &str,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        Ok(self.next().await)
    }
}

struct ThemedStore {
    config: Mutex<DashboardConfig>,
    updates: Mutex<Vec<DashboardConfig>>,
}

impl ThemedStore {
    fn new() -> Self {
        let layout = vec![
            LayoutItem {
                widget: json!({"name": "c1", "spec": {"widgetType": "counter"}}),
                position: GridRect::new(0, 0, 2, 2),
            },
            LayoutItem {
                widget: json!({"name": "b1", "spec": {"widgetType": "bar"}}),
                position: GridRect::new(0, 2, 6, 6),
            },
        ];
        let dataset = DataSourceSpec {
            name: "sales".to_string(),
            display_name: "Sales".to_string(),
            query_lines: Some(vec!["SELECT * FROM sales".to_string()]),
            asset_name: None,
        };
        Self {
            config: Mutex::new(DashboardConfig::new(dataset, layout, "page1".to_string())),
            updates: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DashboardStore for ThemedStore {
    async fn create(&self, _config: &DashboardConfig, _name: &str) -> Result<String, StoreError> {
        Ok("dash-9".to_string())
    }

    async fn update(&self, id: &str, config: &DashboardConfig) -> Result<String, StoreError> {
        *self.config.lock().await = config.clone();
        self.updates.lock().await.push(config.clone());
        Ok(id.to_string())
    }

    async fn get(&self, _id: &str) -> Result<DashboardConfig, StoreError> {
        Ok(self.config.lock().await.clone())
    }

    async fn delete(&self, id: &str) -> Result<(bool, String), StoreError> {
        Ok((true, format!("Dashboard {id} deleted")))
    }

    async fn publish(&self, _id: &str) -> Result<(), StoreError> {
        Ok(())
    }

    fn embed_url(&self, id: &str) -> String {
        format!("https://store.test/embed/dashboardsv3/{id}?o=0")
    }

    fn dashboard_url(&self, id: &str) -> String {
        format!("https://store.test/dashboardsv3/{id}")
    }
}

fn theme_json(canvas: &str) -> serde_json::Value {
    json!({
        "canvasBackgroundColor": canvas,
        "widgetBackgroundColor": "#FFFFFF",
        "widgetBorderColor": "#D0D7DE",
        "fontColor": "#1A2733",
        "visualizationColors": ["#0B6E99", "#E8590C", "#2B8A3E", "#862E9C", "#C92A2A"],
        "fontFamily": "Georgia"
    })
}

fn proposal_json(canvas: &str, feedback: &str) -> String {
    json!({
        "styleFeedback": feedback,
        "reasoning": "Cool tones keep the charts readable",
        "theme": theme_json(canvas)
    })
    .to_string()
}

fn engine(responses: Vec<String>) -> (DesignEngine, Arc<ThemedStore>) {
    let store = Arc::new(ThemedStore::new());
    let llm = Arc::new(QueuedLlm::new(responses));
    (
        DesignEngine::new(llm, Arc::clone(&store) as Arc<dyn DashboardStore>),
        store,
    )
}

#[tokio::test]
async fn propose_refine_validate_round_trip() {
    let (engine, store) = engine(vec![
        proposal_json("#F4F7FA", "A calm blue direction"),
        proposal_json("#EDF2F7", "Softened the canvas as requested"),
    ]);

    let proposal = engine.propose("dash-9", "make it calm and blue").await.unwrap();
    assert_eq!(proposal.style_feedback, "A calm blue direction");
    assert_eq!(proposal.theme.canvas_color, "#F4F7FA");
    // Analysis-path palettes are padded to the full series count.
    assert_eq!(proposal.theme.visualization_colors.len(), 30);
    // Nothing applied yet.
    assert!(store.updates.lock().await.is_empty());

    let refined = engine.refine("dash-9", "a bit softer please").await.unwrap();
    assert_eq!(refined.theme.canvas_color, "#EDF2F7");

    let applied = engine.validate("dash-9").await.unwrap();
    assert_eq!(applied.dashboard_id, "dash-9");
    assert!(applied.embed_url.contains("dash-9"));

    let updates = store.updates.lock().await;
    assert_eq!(updates.len(), 1);
    let ui = updates[0].ui_settings.as_ref().expect("theme applied");
    assert_eq!(ui.theme.canvas_background_color.light, "#EDF2F7");
    assert_eq!(ui.theme.font_family, "Georgia");
    // Platform dark-mode values are filled in on apply.
    assert_eq!(ui.theme.canvas_background_color.dark.as_deref(), Some("#1F272D"));
}

#[tokio::test]
async fn validate_consumes_the_session() {
    let (engine, _store) = engine(vec![proposal_json("#F4F7FA", "ok")]);
    engine.propose("dash-9", "blue").await.unwrap();
    engine.validate("dash-9").await.unwrap();

    let again = engine.validate("dash-9").await;
    assert!(matches!(again, Err(DesignError::NoActiveSession(_))));
}

#[tokio::test]
async fn refine_without_a_proposal_is_rejected() {
    let (engine, _store) = engine(vec![proposal_json("#F4F7FA", "ok")]);
    let result = engine.refine("dash-9", "darker").await;
    assert!(matches!(result, Err(DesignError::NoActiveSession(_))));
}

#[tokio::test]
async fn discard_drops_the_proposal_without_updating() {
    let (engine, store) = engine(vec![proposal_json("#F4F7FA", "ok")]);
    engine.propose("dash-9", "blue").await.unwrap();
    engine.discard("dash-9").await.unwrap();

    assert!(store.updates.lock().await.is_empty());
    assert!(matches!(
        engine.validate("dash-9").await,
        Err(DesignError::NoActiveSession(_))
    ));
}

#[tokio::test]
async fn image_infusion_applies_immediately() {
    let (engine, store) = engine(vec![theme_json("#FFF8E7").to_string()]);
    // "hello" base64-encoded, with a data-URL prefix the engine must strip.
    let applied = engine
        .infuse_from_image("dash-9", "data:image/png;base64,aGVsbG8=")
        .await
        .unwrap();
    assert_eq!(applied.dashboard_id, "dash-9");

    let updates = store.updates.lock().await;
    assert_eq!(updates.len(), 1);
    let ui = updates[0].ui_settings.as_ref().unwrap();
    assert_eq!(ui.theme.canvas_background_color.light, "#FFF8E7");
    assert!(ui.theme.visualization_colors.len() >= 5);
}

#[tokio::test]
async fn invalid_base64_image_is_rejected_before_the_model_call() {
    let (engine, store) = engine(vec![theme_json("#FFF8E7").to_string()]);
    let result = engine.infuse_from_image("dash-9", "!!not-base64!!").await;
    assert!(matches!(result, Err(DesignError::Validation(_))));
    assert!(store.updates.lock().await.is_empty());
}

#[tokio::test]
async fn unreadable_theme_from_the_model_is_rejected() {
    let bad = json!({
        "canvasBackgroundColor": "#FFFFFF",
        "widgetBackgroundColor": "#FFFFFF",
        "widgetBorderColor": "#E0E0E0",
        "fontColor": "#FEFEFE",
        "visualizationColors": ["#0B6E99", "#E8590C", "#2B8A3E", "#862E9C", "#C92A2A"],
        "fontFamily": "Georgia"
    })
    .to_string();
    let (engine, store) = engine(vec![bad]);
    let result = engine.infuse_from_image("dash-9", "aGVsbG8=").await;
    assert!(matches!(result, Err(DesignError::Contract(_))));
    assert!(store.updates.lock().await.is_empty());
}
