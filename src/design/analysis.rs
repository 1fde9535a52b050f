//! Deterministic structural analysis of an existing dashboard. The profile
//! feeds the design prompts so proposals reflect what is actually on the
//! canvas, not a generic guess.

use std::collections::BTreeMap;

use crate::generation::types::DashboardConfig;

use super::types::DesignTheme;

/// Widget rows are laid out on a 2-unit vertical rhythm for KPIs and 6 for
/// charts; 4 is a workable average for a coarse row estimate.
const APPROX_ROW_HEIGHT: i32 = 4;

#[derive(Debug, Clone)]
pub struct DashboardProfile {
    pub widget_counts: BTreeMap<String, usize>,
    pub total_widgets: usize,
    pub approximate_rows: i32,
    pub current_theme: DesignTheme,
}

/// Reads widget kinds, canvas extent and the active theme straight from the
/// stored configuration. No model call involved.
pub fn profile(config: &DashboardConfig) -> DashboardProfile {
    let mut widget_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut max_extent = 0;

    for page in &config.pages {
        for item in &page.layout {
            if item.is_spacer() {
                continue;
            }
            let kind = item.widget_type().unwrap_or("unknown");
            *widget_counts.entry(kind.to_string()).or_default() += 1;
            max_extent = max_extent.max(item.position.y + item.position.height);
        }
    }

    let total_widgets = widget_counts.values().sum();
    let current_theme = config
        .ui_settings
        .as_ref()
        .map(|ui| ui.to_theme())
        .unwrap_or_default();

    DashboardProfile {
        widget_counts,
        total_widgets,
        approximate_rows: (max_extent + APPROX_ROW_HEIGHT - 1) / APPROX_ROW_HEIGHT,
        current_theme,
    }
}

impl DashboardProfile {
    /// Prose summary embedded into the design prompt.
    pub fn describe(&self) -> String {
        let breakdown = self
            .widget_counts
            .iter()
            .map(|(kind, count)| format!("{count} {kind}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "The dashboard contains {} widgets ({breakdown}) across roughly {} rows. \
             Current theme: canvas {}, widget background {}, border {}, font color {}, \
             font family {}, {} visualization colors.",
            self.total_widgets,
            self.approximate_rows,
            self.current_theme.canvas_color,
            self.current_theme.widget_color,
            self.current_theme.widget_border_color,
            self.current_theme.font_color,
            self.current_theme.font_family,
            self.current_theme.visualization_colors.len(),
        )
    }
}
