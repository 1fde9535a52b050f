//! Session-based generation orchestrator.
//!
//! One worker task per generation request; the worker is the sole writer of
//! its session record. Pollers read through [`SessionRegistry`], and the
//! first poll that observes a terminal status receives the result record and
//! deletes the session (at-most-once delivery).

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use rand::Rng;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::GenerationError;
use super::layout;
use super::prompts;
use super::types::{
    DashboardConfig, GenerationResult, GenerationSession, PollResponse, SessionStatus,
    StartGenerationRequest, WidgetPlan,
};
use crate::llm::{strip_code_fences, LlmGateway};
use crate::store::{DashboardStore, StoreError};

/// Bounded retention for the append-only step log; pollers always see an
/// ordered, capped sequence.
const MAX_STEPS: usize = 256;

struct SessionEntry {
    session: GenerationSession,
    result: Option<GenerationResult>,
    cancel: CancellationToken,
}

/// Concurrency-safe session store. Each key is written by exactly one worker
/// and read by arbitrary pollers.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    entries: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn insert(&self, id: Uuid, cancel: CancellationToken) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            id,
            SessionEntry {
                session: GenerationSession::new(id),
                result: None,
                cancel,
            },
        );
    }

    pub async fn append_step(&self, id: Uuid, step: impl Into<String>) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(&id) {
            if entry.session.steps.len() >= MAX_STEPS {
                entry.session.steps.remove(0);
            }
            entry.session.steps.push(step.into());
        }
    }

    async fn set_status(&self, id: Uuid, status: SessionStatus) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(&id) {
            entry.session.status = status;
        }
    }

    async fn set_reasoning(&self, id: Uuid, reasoning: String, notes: Vec<String>) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(&id) {
            entry.session.reasoning = reasoning;
            entry.session.widget_notes = notes;
        }
    }

    /// Records the final result. Always called before the terminal status
    /// flip so a poller can never observe `completed` without a result.
    async fn set_result(&self, id: Uuid, result: GenerationResult) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(&id) {
            entry.result = Some(result);
        }
    }

    /// Progress read; a poll observing a terminal status consumes the
    /// session. A subsequent poll for the same id is a `NotFound`.
    pub async fn poll(&self, id: Uuid) -> Result<PollResponse, GenerationError> {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get(&id) else {
            return Err(GenerationError::NotFound(format!("session {id}")));
        };

        if !entry.session.status.is_terminal() {
            return Ok(PollResponse {
                status: entry.session.status,
                steps: entry.session.steps.clone(),
                reasoning: entry.session.reasoning.clone(),
                widget_notes: entry.session.widget_notes.clone(),
                result: None,
            });
        }

        // The first terminal observation consumes the session.
        let entry = entries
            .remove(&id)
            .ok_or_else(|| GenerationError::NotFound(format!("session {id}")))?;
        Ok(PollResponse {
            status: entry.session.status,
            steps: entry.session.steps,
            reasoning: entry.session.reasoning,
            widget_notes: entry.session.widget_notes,
            result: entry.result,
        })
    }

    pub async fn cancel(&self, id: Uuid) -> Result<(), GenerationError> {
        let entries = self.entries.lock().await;
        let Some(entry) = entries.get(&id) else {
            return Err(GenerationError::NotFound(format!("session {id}")));
        };
        entry.cancel.cancel();
        Ok(())
    }
}

pub struct Orchestrator {
    llm: Arc<dyn LlmGateway>,
    store: Arc<dyn DashboardStore>,
    pub sessions: SessionRegistry,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmGateway>, store: Arc<dyn DashboardStore>) -> Self {
        Self {
            llm,
            store,
            sessions: SessionRegistry::new(),
        }
    }

    /// Starts one generation worker and returns its session id. The session
    /// record exists before this returns, so an immediate poll finds it in
    /// the `initializing` state rather than missing.
    pub async fn start_generation(self: &Arc<Self>, request: StartGenerationRequest) -> Uuid {
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        self.sessions.insert(id, cancel.clone()).await;

        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.run_worker(id, request, cancel).await {
                error!(session = %id, "generation failed: {e:#}");
                this.sessions.append_step(id, format!("Error: {e}")).await;
                this.sessions
                    .set_result(
                        id,
                        GenerationResult {
                            store_id: None,
                            name: None,
                            preview: None,
                            config: None,
                            widget_summary: Vec::new(),
                            error: Some(format!("{e:#}")),
                        },
                    )
                    .await;
                this.sessions.set_status(id, SessionStatus::Error).await;
            }
        });

        id
    }

    /// The five-step pipeline, strictly sequential. Cancellation is checked
    /// between steps; a cancelled worker terminates with an error status
    /// instead of running to completion.
    async fn run_worker(
        &self,
        id: Uuid,
        request: StartGenerationRequest,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        let sessions = &self.sessions;
        let checkpoint = |label: &'static str| {
            if cancel.is_cancelled() {
                Err(anyhow!("generation cancelled before {label}"))
            } else {
                Ok(())
            }
        };

        sessions.set_status(id, SessionStatus::Running).await;
        sessions
            .append_step(id, "Step 1: Analyzing your request with AI...")
            .await;

        let metric_view = request.dataset.is_metric_view();
        let system_prompt = prompts::plan_system_prompt(
            &request.columns,
            request.column_types.as_deref(),
            metric_view,
        );

        checkpoint("plan request")?;
        sessions
            .append_step(id, "Step 2: Calling LLM to analyze requirements...")
            .await;
        let raw = self
            .llm
            .complete(Some(&system_prompt), &request.prompt, 1000)
            .await?;

        let plan: WidgetPlan = serde_json::from_str(strip_code_fences(&raw))
            .map_err(|e| GenerationError::LlmContract(format!("plan contract: {e}")))?;
        plan.validate()
            .map_err(|e| GenerationError::LlmContract(format!("plan contract: {e}")))?;
        let reasoning = plan
            .reasoning
            .clone()
            .unwrap_or_else(|| "AI is building your dashboard based on your requirements.".into());
        sessions.append_step(id, "Step 3: Received AI analysis").await;
        sessions
            .set_reasoning(id, reasoning, plan.widget_notes())
            .await;

        if plan.is_empty() {
            warn!(session = %id, "plan contained no widgets");
            sessions
                .append_step(id, "No widgets were suggested by AI")
                .await;
            sessions
                .set_result(
                    id,
                    GenerationResult {
                        store_id: None,
                        name: None,
                        preview: None,
                        config: None,
                        widget_summary: Vec::new(),
                        error: Some("AI did not suggest any widgets".into()),
                    },
                )
                .await;
            sessions
                .set_status(id, SessionStatus::NoWidgetsSuggested)
                .await;
            return Ok(());
        }

        checkpoint("layout synthesis")?;
        sessions
            .append_step(id, "Step 4: Building dashboard layout...")
            .await;
        let outcome = layout::synthesize(
            &plan,
            &request.dataset.name,
            &request.columns,
            request.column_types.as_deref(),
            metric_view,
        );
        for summary in &outcome.summaries {
            sessions.append_step(id, format!("Widget created: {summary}")).await;
        }

        checkpoint("configuration assembly")?;
        sessions
            .append_step(id, "Step 5: Building dashboard configuration...")
            .await;
        let mut config =
            DashboardConfig::new(request.dataset.clone(), outcome.items, random_suffix(8));
        if let Some(theme) = request.theme {
            config.replace_theme(theme);
            sessions.append_step(id, "Applied design infusion theme").await;
        }

        let base_name = plan
            .dashboard_name
            .clone()
            .unwrap_or_else(|| "AI Generated Dashboard".into());
        let name = format!("{base_name} ({})", random_suffix(6));
        sessions
            .append_step(id, format!("Dashboard name: {name}"))
            .await;

        checkpoint("deployment")?;
        sessions
            .append_step(id, "Step 6: Deploying dashboard...")
            .await;
        let store_id = self.store.create(&config, &name).await?;
        sessions
            .append_step(id, format!("Dashboard created (ID: {store_id})"))
            .await;
        // A publish failure after a successful create is surfaced distinctly;
        // the dashboard is left in place unpublished.
        self.store
            .publish(&store_id)
            .await
            .map_err(|e| match e {
                StoreError::PublishFailed { .. } => e,
                other => StoreError::PublishFailed {
                    id: store_id.clone(),
                    message: other.to_string(),
                },
            })?;
        let preview = self.store.embed_url(&store_id);
        info!(session = %id, dashboard = %store_id, "dashboard deployed");

        sessions
            .set_result(
                id,
                GenerationResult {
                    store_id: Some(store_id),
                    name: Some(name),
                    preview: Some(preview),
                    config: Some(config),
                    widget_summary: outcome.summaries,
                    error: None,
                },
            )
            .await;
        sessions.set_status(id, SessionStatus::Completed).await;
        sessions
            .append_step(id, "Dashboard deployed successfully!")
            .await;
        Ok(())
    }
}

/// Lowercase alphanumeric suffix for dashboard and page names.
pub fn random_suffix(len: usize) -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn step_log_is_capped() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        registry.insert(id, CancellationToken::new()).await;

        for i in 0..(MAX_STEPS + 10) {
            registry.append_step(id, format!("step {i}")).await;
        }
        let progress = registry.poll(id).await.unwrap();
        assert_eq!(progress.steps.len(), MAX_STEPS);
        // Oldest entries dropped first.
        assert_eq!(progress.steps[0], "step 10");
    }

    #[tokio::test]
    async fn terminal_poll_consumes_the_session() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        registry.insert(id, CancellationToken::new()).await;
        registry
            .set_result(
                id,
                GenerationResult {
                    store_id: Some("d1".into()),
                    name: Some("Ops".into()),
                    preview: None,
                    config: None,
                    widget_summary: Vec::new(),
                    error: None,
                },
            )
            .await;
        registry.set_status(id, SessionStatus::Completed).await;

        let first = registry.poll(id).await.unwrap();
        assert_eq!(first.status, SessionStatus::Completed);
        assert_eq!(first.result.unwrap().store_id.as_deref(), Some("d1"));

        let second = registry.poll(id).await;
        assert!(matches!(second, Err(GenerationError::NotFound(_))));
    }

    #[tokio::test]
    async fn non_terminal_poll_leaves_the_session_in_place() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        registry.insert(id, CancellationToken::new()).await;
        registry.set_status(id, SessionStatus::Running).await;

        for _ in 0..3 {
            let progress = registry.poll(id).await.unwrap();
            assert_eq!(progress.status, SessionStatus::Running);
            assert!(progress.result.is_none());
        }
    }

    #[tokio::test]
    async fn cancel_unknown_session_is_not_found() {
        let registry = SessionRegistry::new();
        let result = registry.cancel(Uuid::new_v4()).await;
        assert!(matches!(result, Err(GenerationError::NotFound(_))));
    }
}
