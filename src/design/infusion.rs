//! Design infusion engine: image-driven theme extraction, prompt-driven
//! proposals with structural analysis, and the multi-turn refinement loop.
//!
//! Session lifecycle per dashboard: a proposal opens (or replaces) a session,
//! refine turns rewrite it in place, and validate or discard closes it.
//! Image infusion bypasses the session entirely and applies at once.

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::llm::{strip_code_fences, LlmGateway};
use crate::store::DashboardStore;

use super::analysis;
use super::color;
use super::error::DesignError;
use super::types::{
    AppliedDesignResponse, DesignProposal, DesignTheme, RefinementContext, UiSettings,
    ANALYSIS_VISUALIZATION_COLORS, DEFAULT_FONT_FAMILY, DEFAULT_PALETTE, FONT_FAMILIES,
    MIN_VISUALIZATION_COLORS,
};

const DESIGN_MAX_TOKENS: u32 = 500;

/// Pairwise distinguishability is only enforced on this leading slice of the
/// palette; later entries are rarely rendered side by side.
const DISTINGUISHABLE_PREFIX: usize = 8;

/// How the sanitized palette is sized for each path.
#[derive(Debug, Clone, Copy)]
enum PaletteRule {
    AtLeast(usize),
    Exactly(usize),
}

struct DesignSession {
    context: RefinementContext,
    proposal: DesignProposal,
}

/// Shape of the model's design responses.
#[derive(Deserialize)]
struct ProposalWire {
    #[serde(rename = "styleFeedback", default)]
    style_feedback: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    theme: DesignTheme,
}

pub struct DesignEngine {
    llm: Arc<dyn LlmGateway>,
    store: Arc<dyn DashboardStore>,
    sessions: Mutex<HashMap<String, DesignSession>>,
}

impl DesignEngine {
    pub fn new(llm: Arc<dyn LlmGateway>, store: Arc<dyn DashboardStore>) -> Self {
        Self {
            llm,
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Extracts a theme from an uploaded image and applies it immediately.
    /// No proposal round-trip: the image is the user's decision.
    pub async fn infuse_from_image(
        &self,
        dashboard_id: &str,
        image: &str,
    ) -> Result<AppliedDesignResponse, DesignError> {
        let image = image
            .rsplit_once("base64,")
            .map(|(_, data)| data)
            .unwrap_or(image);
        let image = image.trim();
        if image.is_empty() {
            return Err(DesignError::Validation("image payload is empty".into()));
        }
        if BASE64.decode(image).is_err() {
            return Err(DesignError::Validation(
                "image payload is not valid base64".into(),
            ));
        }

        let raw = self
            .llm
            .complete_with_image(&image_theme_prompt(), image, DESIGN_MAX_TOKENS)
            .await?;
        let theme: DesignTheme = serde_json::from_str(strip_code_fences(&raw))
            .map_err(|e| DesignError::Contract(e.to_string()))?;
        let theme = sanitize_theme(theme, PaletteRule::AtLeast(MIN_VISUALIZATION_COLORS))?;

        self.apply_theme(dashboard_id, &theme).await
    }

    /// Analyzes the dashboard structure, asks the model for a matching theme,
    /// and parks the result as a pending proposal.
    pub async fn propose(
        &self,
        dashboard_id: &str,
        prompt: &str,
    ) -> Result<DesignProposal, DesignError> {
        if prompt.trim().is_empty() {
            return Err(DesignError::Validation("prompt must not be empty".into()));
        }

        let config = self.store.get(dashboard_id).await?;
        let profile = analysis::profile(&config);

        let raw = self
            .llm
            .complete(
                Some(&proposal_system_prompt(&profile.describe())),
                prompt,
                DESIGN_MAX_TOKENS,
            )
            .await?;
        let proposal = parse_proposal(&raw)?;

        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            dashboard_id.to_string(),
            DesignSession {
                context: RefinementContext {
                    original_prompt: prompt.to_string(),
                    latest_reasoning: proposal.reasoning.clone(),
                    latest_theme: proposal.theme.clone(),
                    prior_theme: profile.current_theme,
                },
                proposal: proposal.clone(),
            },
        );
        info!(dashboard = %dashboard_id, "design proposal ready");
        Ok(proposal)
    }

    /// One refinement turn on the pending proposal. The prior theme is kept
    /// so the model can honor "go back closer to the previous version".
    pub async fn refine(
        &self,
        dashboard_id: &str,
        feedback: &str,
    ) -> Result<DesignProposal, DesignError> {
        if feedback.trim().is_empty() {
            return Err(DesignError::Validation("feedback must not be empty".into()));
        }

        let context = {
            let sessions = self.sessions.lock().await;
            sessions
                .get(dashboard_id)
                .map(|s| s.context.clone())
                .ok_or_else(|| DesignError::NoActiveSession(dashboard_id.to_string()))?
        };

        let raw = self
            .llm
            .complete(
                Some(&refine_system_prompt(&context)),
                feedback,
                DESIGN_MAX_TOKENS,
            )
            .await?;
        let proposal = parse_proposal(&raw)?;

        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(dashboard_id)
            .ok_or_else(|| DesignError::NoActiveSession(dashboard_id.to_string()))?;
        session.context.prior_theme = session.context.latest_theme.clone();
        session.context.latest_theme = proposal.theme.clone();
        session.context.latest_reasoning = proposal.reasoning.clone();
        session.proposal = proposal.clone();
        Ok(proposal)
    }

    /// Applies the pending proposal and closes the session. The session is
    /// only removed after the store accepts the update, so a failed apply
    /// leaves the proposal available for another attempt.
    pub async fn validate(&self, dashboard_id: &str) -> Result<AppliedDesignResponse, DesignError> {
        let theme = {
            let sessions = self.sessions.lock().await;
            sessions
                .get(dashboard_id)
                .map(|s| s.proposal.theme.clone())
                .ok_or_else(|| DesignError::NoActiveSession(dashboard_id.to_string()))?
        };

        let applied = self.apply_theme(dashboard_id, &theme).await?;
        self.sessions.lock().await.remove(dashboard_id);
        info!(dashboard = %dashboard_id, "design applied");
        Ok(applied)
    }

    /// Drops the pending proposal without touching the dashboard.
    pub async fn discard(&self, dashboard_id: &str) -> Result<(), DesignError> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .remove(dashboard_id)
            .map(|_| ())
            .ok_or_else(|| DesignError::NoActiveSession(dashboard_id.to_string()))
    }

    async fn apply_theme(
        &self,
        dashboard_id: &str,
        theme: &DesignTheme,
    ) -> Result<AppliedDesignResponse, DesignError> {
        let mut config = self.store.get(dashboard_id).await?;
        config.replace_theme(UiSettings::from_theme(theme));
        self.store.update(dashboard_id, &config).await?;
        // Republish so viewers of the published dashboard see the new theme.
        self.store.publish(dashboard_id).await?;
        Ok(AppliedDesignResponse {
            dashboard_id: dashboard_id.to_string(),
            embed_url: self.store.embed_url(dashboard_id),
        })
    }
}

fn parse_proposal(raw: &str) -> Result<DesignProposal, DesignError> {
    let wire: ProposalWire = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| DesignError::Contract(e.to_string()))?;
    let theme = sanitize_theme(
        wire.theme,
        PaletteRule::Exactly(ANALYSIS_VISUALIZATION_COLORS),
    )?;
    Ok(DesignProposal {
        style_feedback: wire
            .style_feedback
            .unwrap_or_else(|| "Here is a design direction for your dashboard.".to_string()),
        reasoning: wire.reasoning.unwrap_or_default(),
        theme,
    })
}

/// Repairs what can be repaired (font family, short or clashing palettes) and
/// rejects what cannot (unreadable font-on-background combinations).
fn sanitize_theme(mut theme: DesignTheme, rule: PaletteRule) -> Result<DesignTheme, DesignError> {
    if !FONT_FAMILIES.contains(&theme.font_family.as_str()) {
        theme.font_family = DEFAULT_FONT_FAMILY.to_string();
    }

    for (label, value) in [
        ("canvasBackgroundColor", &theme.canvas_color),
        ("widgetBackgroundColor", &theme.widget_color),
        ("widgetBorderColor", &theme.widget_border_color),
        ("fontColor", &theme.font_color),
    ] {
        if color::parse_hex(value).is_none() {
            return Err(DesignError::Contract(format!(
                "{label} is not a hex color: {value}"
            )));
        }
    }

    if color::is_near_white(&theme.font_color) && color::is_near_white(&theme.widget_color) {
        return Err(DesignError::Contract(
            "font color is unreadable against the widget background".into(),
        ));
    }

    theme
        .visualization_colors
        .retain(|c| color::parse_hex(c).is_some());

    let mut fallback: Vec<String> = DEFAULT_PALETTE
        .iter()
        .map(|c| c.to_string())
        .filter(|c| !theme.visualization_colors.contains(c))
        .collect();

    // Palette entries that vanish against light backgrounds get swapped out;
    // every default palette color is dark enough to survive.
    let light_backgrounds =
        color::is_near_white(&theme.canvas_color) || color::is_near_white(&theme.widget_color);
    if light_backgrounds {
        let mut pad_idx = 0;
        for slot in theme.visualization_colors.iter_mut() {
            if color::is_near_white(slot) {
                *slot = next_palette_color(&mut fallback, &mut pad_idx);
            }
        }
    }

    // Swap out leading palette entries that clash with an earlier one.
    for i in 1..theme.visualization_colors.len().min(DISTINGUISHABLE_PREFIX) {
        let clashes = |candidate: &str, colors: &[String]| {
            colors[..i]
                .iter()
                .any(|earlier| !color::distinguishable(earlier, candidate))
        };
        if clashes(&theme.visualization_colors[i], &theme.visualization_colors) {
            let pick = fallback
                .iter()
                .position(|c| !clashes(c, &theme.visualization_colors));
            if let Some(pos) = pick {
                theme.visualization_colors[i] = fallback.remove(pos);
            }
        }
    }

    let target = match rule {
        PaletteRule::AtLeast(min) => theme.visualization_colors.len().max(min),
        PaletteRule::Exactly(n) => n,
    };
    // Pad from the unused defaults first so the leading slice stays
    // duplicate-free; only cycle the full default palette once those run out.
    let mut pad_idx = 0;
    while theme.visualization_colors.len() < target {
        let next = next_palette_color(&mut fallback, &mut pad_idx);
        theme.visualization_colors.push(next);
    }
    theme.visualization_colors.truncate(target);

    Ok(theme)
}

/// Front of the unused-defaults list while it lasts, then the default palette
/// cycled by index.
fn next_palette_color(fallback: &mut Vec<String>, pad_idx: &mut usize) -> String {
    if !fallback.is_empty() {
        return fallback.remove(0);
    }
    let color = DEFAULT_PALETTE[*pad_idx % DEFAULT_PALETTE.len()].to_string();
    *pad_idx += 1;
    color
}

fn theme_contract() -> &'static str {
    r##"Respond with JSON only:
{
  "canvasBackgroundColor": "#hex",
  "widgetBackgroundColor": "#hex",
  "widgetBorderColor": "#hex",
  "fontColor": "#hex",
  "visualizationColors": ["#hex", ...],
  "fontFamily": "one of: Arial, Brush Script MT, Courier New, Georgia, Impact, Tahoma, Times New Roman, Trebuchet MS, Verdana"
}
The font color must stay readable against the widget background. Visualization colors must be clearly distinguishable from each other."##
}

fn image_theme_prompt() -> String {
    format!(
        "Extract a dashboard color theme from this image. Pick the dominant background, \
         surface and accent colors and build a cohesive palette of at least \
         {MIN_VISUALIZATION_COLORS} chart colors drawn from or harmonizing with the image.\n\n{}",
        theme_contract()
    )
}

fn proposal_system_prompt(profile_summary: &str) -> String {
    format!(
        "You are a dashboard design expert. Propose a complete visual theme that fits the \
         user's request and the dashboard described below.\n\n{profile_summary}\n\n\
         Provide exactly {ANALYSIS_VISUALIZATION_COLORS} visualization colors so every chart \
         series gets a distinct color.\n\n\
         Respond with JSON only:\n\
         {{\n  \"styleFeedback\": \"short, friendly description of the direction you chose\",\n  \
         \"reasoning\": \"why these choices fit this dashboard\",\n  \
         \"theme\": {}\n}}",
        theme_contract()
    )
}

fn refine_system_prompt(context: &RefinementContext) -> String {
    format!(
        "You are refining a dashboard theme across multiple turns.\n\n\
         Original request: {}\n\
         Your previous reasoning: {}\n\
         Current proposed theme: {}\n\
         Theme before that (in case the user wants to move back toward it): {}\n\n\
         Apply the user's feedback to the current proposal. Keep everything they did not \
         ask to change. Provide exactly {ANALYSIS_VISUALIZATION_COLORS} visualization colors.\n\n\
         Respond with JSON only:\n\
         {{\n  \"styleFeedback\": \"short description of what you changed\",\n  \
         \"reasoning\": \"...\",\n  \"theme\": {}\n}}",
        context.original_prompt,
        context.latest_reasoning,
        serde_json::to_string(&context.latest_theme).unwrap_or_default(),
        serde_json::to_string(&context.prior_theme).unwrap_or_default(),
        theme_contract()
    )
}
