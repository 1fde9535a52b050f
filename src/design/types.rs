use serde::{Deserialize, Serialize};

/// Font families the theme contract allows; proposals outside this set are
/// repaired to [`DEFAULT_FONT_FAMILY`].
pub const FONT_FAMILIES: [&str; 9] = [
    "Arial",
    "Brush Script MT",
    "Courier New",
    "Georgia",
    "Impact",
    "Tahoma",
    "Times New Roman",
    "Trebuchet MS",
    "Verdana",
];

pub const DEFAULT_FONT_FAMILY: &str = "Times New Roman";

/// Fallback visualization palette, used to pad short palettes.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#077A9D", "#FFAB00", "#00A972", "#FF3621", "#8BCAE7", "#AB4057", "#99DDB4", "#FCA4A1",
    "#919191", "#BF7080",
];

/// Minimum palette size for themes produced from images or free-form prompts.
pub const MIN_VISUALIZATION_COLORS: usize = 5;
/// Exact palette size for the structural-analysis path; downstream consumers
/// index far into the palette.
pub const ANALYSIS_VISUALIZATION_COLORS: usize = 30;

/// The flat theme shape the language model produces and the refinement
/// context carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignTheme {
    #[serde(rename = "canvasBackgroundColor")]
    pub canvas_color: String,
    #[serde(rename = "widgetBackgroundColor")]
    pub widget_color: String,
    #[serde(rename = "widgetBorderColor")]
    pub widget_border_color: String,
    #[serde(rename = "fontColor")]
    pub font_color: String,
    #[serde(rename = "visualizationColors")]
    pub visualization_colors: Vec<String>,
    #[serde(rename = "fontFamily")]
    pub font_family: String,
}

impl Default for DesignTheme {
    fn default() -> Self {
        Self {
            canvas_color: "#FAFAFB".to_string(),
            widget_color: "#FFFFFF".to_string(),
            widget_border_color: "#E0E0E0".to_string(),
            font_color: "#11171C".to_string(),
            visualization_colors: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

/// Light/dark color pair; the store platform renders both modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorPair {
    pub light: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark: Option<String>,
}

impl ColorPair {
    pub fn with_dark(light: impl Into<String>, dark: &str) -> Self {
        Self {
            light: light.into(),
            dark: Some(dark.to_string()),
        }
    }

    pub fn light_only(light: impl Into<String>) -> Self {
        Self {
            light: light.into(),
            dark: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSettings {
    #[serde(rename = "canvasBackgroundColor")]
    pub canvas_background_color: ColorPair,
    #[serde(rename = "widgetBackgroundColor")]
    pub widget_background_color: ColorPair,
    #[serde(rename = "widgetBorderColor")]
    pub widget_border_color: ColorPair,
    #[serde(rename = "fontColor")]
    pub font_color: ColorPair,
    #[serde(rename = "selectionColor")]
    pub selection_color: ColorPair,
    #[serde(rename = "visualizationColors")]
    pub visualization_colors: Vec<String>,
    #[serde(rename = "widgetHeaderAlignment")]
    pub widget_header_alignment: String,
    #[serde(rename = "fontFamily")]
    pub font_family: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenieSpaceSettings {
    #[serde(rename = "isEnabled")]
    pub is_enabled: bool,
    #[serde(rename = "enablementMode")]
    pub enablement_mode: String,
}

impl Default for GenieSpaceSettings {
    fn default() -> Self {
        Self {
            is_enabled: false,
            enablement_mode: "DISABLED".to_string(),
        }
    }
}

/// The top-level theme object nested into the dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    pub theme: ThemeSettings,
    #[serde(rename = "genieSpace", default)]
    pub genie_space: GenieSpaceSettings,
    #[serde(rename = "applyModeEnabled", default)]
    pub apply_mode_enabled: bool,
}

impl UiSettings {
    /// Wraps a flat theme into the nested light/dark wire shape, filling the
    /// platform's fixed dark-mode and selection values.
    pub fn from_theme(theme: &DesignTheme) -> Self {
        Self {
            theme: ThemeSettings {
                canvas_background_color: ColorPair::with_dark(theme.canvas_color.clone(), "#1F272D"),
                widget_background_color: ColorPair::with_dark(theme.widget_color.clone(), "#11171C"),
                widget_border_color: ColorPair::light_only(theme.widget_border_color.clone()),
                font_color: ColorPair::with_dark(theme.font_color.clone(), "#E8ECF0"),
                selection_color: ColorPair::with_dark("#2272B4", "#8ACAFF"),
                visualization_colors: theme.visualization_colors.clone(),
                widget_header_alignment: "LEFT".to_string(),
                font_family: theme.font_family.clone(),
            },
            genie_space: GenieSpaceSettings::default(),
            apply_mode_enabled: false,
        }
    }

    /// Flattens the light-mode values back into the shape the refinement
    /// prompts carry.
    pub fn to_theme(&self) -> DesignTheme {
        DesignTheme {
            canvas_color: self.theme.canvas_background_color.light.clone(),
            widget_color: self.theme.widget_background_color.light.clone(),
            widget_border_color: self.theme.widget_border_color.light.clone(),
            font_color: self.theme.font_color.light.clone(),
            visualization_colors: self.theme.visualization_colors.clone(),
            font_family: self.theme.font_family.clone(),
        }
    }
}

/// Minimal state carried across refinement turns. Lives for the duration of
/// one interactive design session and is discarded on validate or abandon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementContext {
    pub original_prompt: String,
    pub latest_reasoning: String,
    pub latest_theme: DesignTheme,
    pub prior_theme: DesignTheme,
}

/// A proposed (not yet applied) design, held server-side until the caller
/// validates, refines, or abandons it.
#[derive(Debug, Clone, Serialize)]
pub struct DesignProposal {
    pub style_feedback: String,
    pub reasoning: String,
    pub theme: DesignTheme,
}

#[derive(Debug, Deserialize)]
pub struct ImageInfusionRequest {
    /// Base64 image, with or without a data-URL prefix.
    pub image: String,
}

#[derive(Debug, Deserialize)]
pub struct ProposalRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct AppliedDesignResponse {
    pub dashboard_id: String,
    pub embed_url: String,
}
