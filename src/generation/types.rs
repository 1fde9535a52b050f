use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::design::types::UiSettings;

/// Grid canvas width in layout units.
pub const GRID_WIDTH: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregation {
    /// Reserved for pre-aggregated measure columns; rendered as `MEASURE()`.
    None,
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl Aggregation {
    pub fn sql_name(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Max => "MAX",
            Self::Min => "MIN",
        }
    }

    pub fn field_prefix(&self) -> &'static str {
        match self {
            Self::None => "measure",
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    /// Human prefix used when deriving widget titles ("Total Revenue").
    pub fn title_prefix(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Count => "Total",
            Self::Sum => "Total",
            Self::Avg => "Average",
            Self::Max => "Maximum",
            Self::Min => "Minimum",
        }
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl std::str::FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "COUNT" => Ok(Self::Count),
            "SUM" => Ok(Self::Sum),
            "AVG" => Ok(Self::Avg),
            "MAX" => Ok(Self::Max),
            "MIN" => Ok(Self::Min),
            other => Err(format!("unknown aggregation: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeGranularity {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
}

impl TimeGranularity {
    pub fn sql_name(&self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Quarter => "QUARTER",
            Self::Month => "MONTH",
            Self::Week => "WEEK",
            Self::Day => "DAY",
            Self::Hour => "HOUR",
        }
    }
}

impl std::fmt::Display for TimeGranularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl std::str::FromStr for TimeGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "YEAR" => Ok(Self::Year),
            "QUARTER" => Ok(Self::Quarter),
            "MONTH" => Ok(Self::Month),
            "WEEK" => Ok(Self::Week),
            "DAY" => Ok(Self::Day),
            "HOUR" => Ok(Self::Hour),
            other => Err(format!("unknown time granularity: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterSpec {
    pub value_column: String,
    pub aggregation: Aggregation,
    pub label: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSpec {
    pub column: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    pub columns: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarChartSpec {
    pub x_column: String,
    pub y_column: String,
    pub aggregation: Aggregation,
    #[serde(default)]
    pub color_column: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineChartSpec {
    pub x_column: String,
    pub y_column: String,
    pub aggregation: Aggregation,
    pub time_granularity: TimeGranularity,
    #[serde(default)]
    pub color_column: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieChartSpec {
    pub value_column: String,
    pub aggregation: Aggregation,
    pub category_column: String,
    pub title: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotSpec {
    pub row_columns: Vec<String>,
    pub value_column: String,
    pub aggregation: Aggregation,
    pub title: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// One widget kind requested by the plan. Each widget is owned by exactly one
/// layout item once placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetSpec {
    Counter(CounterSpec),
    Filter(FilterSpec),
    Table(TableSpec),
    BarChart(BarChartSpec),
    LineChart(LineChartSpec),
    PieChart(PieChartSpec),
    Pivot(PivotSpec),
}

impl WidgetSpec {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Counter(_) => "Counter",
            Self::Filter(_) => "Filter",
            Self::Table(_) => "Table",
            Self::BarChart(_) => "Bar Chart",
            Self::LineChart(_) => "Line Chart",
            Self::PieChart(_) => "Pie Chart",
            Self::Pivot(_) => "Pivot",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Counter(s) => s.reason.as_deref(),
            Self::Filter(s) => s.reason.as_deref(),
            Self::Table(s) => s.reason.as_deref(),
            Self::BarChart(s) => s.reason.as_deref(),
            Self::LineChart(s) => s.reason.as_deref(),
            Self::PieChart(s) => s.reason.as_deref(),
            Self::Pivot(s) => s.reason.as_deref(),
        }
    }
}

/// The structured plan returned by the language model. Validated strictly at
/// the gateway boundary; malformed responses never reach the layout stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetPlan {
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub counters: Vec<CounterSpec>,
    #[serde(default)]
    pub filter: Option<FilterSpec>,
    #[serde(default)]
    pub table: Option<TableSpec>,
    #[serde(default)]
    pub bar_chart: Option<BarChartSpec>,
    #[serde(default)]
    pub line_chart: Option<LineChartSpec>,
    #[serde(default)]
    pub pie_chart: Option<PieChartSpec>,
    #[serde(default)]
    pub pivot: Option<PivotSpec>,
    #[serde(default)]
    pub dashboard_name: Option<String>,
}

impl WidgetPlan {
    /// Every requested widget as a tagged [`WidgetSpec`], in plan order.
    pub fn widgets(&self) -> Vec<WidgetSpec> {
        let mut widgets = Vec::new();
        if let Some(f) = &self.filter {
            widgets.push(WidgetSpec::Filter(f.clone()));
        }
        for c in &self.counters {
            widgets.push(WidgetSpec::Counter(c.clone()));
        }
        if let Some(t) = &self.table {
            widgets.push(WidgetSpec::Table(t.clone()));
        }
        if let Some(b) = &self.bar_chart {
            widgets.push(WidgetSpec::BarChart(b.clone()));
        }
        if let Some(l) = &self.line_chart {
            widgets.push(WidgetSpec::LineChart(l.clone()));
        }
        if let Some(p) = &self.pie_chart {
            widgets.push(WidgetSpec::PieChart(p.clone()));
        }
        if let Some(p) = &self.pivot {
            widgets.push(WidgetSpec::Pivot(p.clone()));
        }
        widgets
    }

    pub fn is_empty(&self) -> bool {
        self.widgets().is_empty()
    }

    /// Structural checks the JSON shape alone cannot express. A plan that
    /// fails here never reaches layout synthesis.
    pub fn validate(&self) -> Result<(), String> {
        for widget in self.widgets() {
            match &widget {
                WidgetSpec::Pivot(pivot) if pivot.row_columns.is_empty() => {
                    return Err("pivot requires at least one row column".to_string());
                }
                WidgetSpec::Table(table) if table.columns.is_empty() => {
                    return Err("table requires at least one column".to_string());
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Reason strings supplied per widget, in plan order.
    pub fn widget_notes(&self) -> Vec<String> {
        self.widgets()
            .iter()
            .filter_map(|w| w.reason().map(|r| format!("{}: {r}", w.kind_label())))
            .collect()
    }
}

/// Integer rectangle in grid units. The canvas is [`GRID_WIDTH`] columns wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl GridRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn in_bounds(&self) -> bool {
        self.x >= 0 && self.width > 0 && self.height > 0 && self.x + self.width <= GRID_WIDTH
    }
}

/// A rendered widget paired with its grid position. This is the wire shape
/// (`pages[0].layout` entries) the store adapter consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutItem {
    pub widget: Value,
    pub position: GridRect,
}

impl LayoutItem {
    pub fn widget_type(&self) -> Option<&str> {
        self.widget["spec"]["widgetType"].as_str()
    }

    /// Spacers are bare text widgets without a `spec` block.
    pub fn is_spacer(&self) -> bool {
        self.widget.get("multilineTextboxSpec").is_some()
    }
}

/// Column metadata from the data source; drives prompt construction and the
/// measure/dimension rules for metric views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub col_type: String,
    #[serde(default)]
    pub is_measure: bool,
}

/// The tabular data source backing the dashboard. Metric views carry an
/// `asset_name` instead of query lines and expose pre-aggregated measures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceSpec {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "queryLines", skip_serializing_if = "Option::is_none")]
    pub query_lines: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
}

impl DataSourceSpec {
    pub fn is_metric_view(&self) -> bool {
        self.asset_name.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardPage {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub layout: Vec<LayoutItem>,
    #[serde(rename = "pageType")]
    pub page_type: String,
}

/// The unit of exchange with the dashboard store. The theme field is only
/// ever replaced wholesale, never patched field by field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub datasets: Vec<DataSourceSpec>,
    pub pages: Vec<DashboardPage>,
    #[serde(rename = "uiSettings", skip_serializing_if = "Option::is_none")]
    pub ui_settings: Option<UiSettings>,
}

impl DashboardConfig {
    pub fn new(dataset: DataSourceSpec, layout: Vec<LayoutItem>, page_name: String) -> Self {
        Self {
            datasets: vec![dataset],
            pages: vec![DashboardPage {
                name: page_name,
                display_name: "Overview".to_string(),
                layout,
                page_type: "PAGE_TYPE_CANVAS".to_string(),
            }],
            ui_settings: None,
        }
    }

    /// Full delete-and-reinsert of the theme; avoids stale sub-fields from a
    /// previous theme shape.
    pub fn replace_theme(&mut self, settings: UiSettings) {
        self.ui_settings = Some(settings);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initializing,
    Running,
    Completed,
    Error,
    NoWidgetsSuggested,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Error | Self::NoWidgetsSuggested
        )
    }
}

/// Progress record for one in-flight generation. Written only by the owning
/// worker; read by arbitrary pollers.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSession {
    pub id: Uuid,
    pub status: SessionStatus,
    pub steps: Vec<String>,
    pub reasoning: String,
    pub widget_notes: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl GenerationSession {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            status: SessionStatus::Initializing,
            steps: Vec::new(),
            reasoning: String::new(),
            widget_notes: Vec::new(),
            started_at: Utc::now(),
        }
    }
}

/// Final result record, written before the status flips to a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub store_id: Option<String>,
    pub name: Option<String>,
    pub preview: Option<String>,
    pub config: Option<DashboardConfig>,
    pub widget_summary: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartGenerationRequest {
    pub prompt: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub column_types: Option<Vec<ColumnInfo>>,
    pub dataset: DataSourceSpec,
    /// Optional theme from a prior design-infusion session, applied to the
    /// generated configuration before deployment.
    #[serde(default)]
    pub theme: Option<UiSettings>,
}

#[derive(Debug, Serialize)]
pub struct StartGenerationResponse {
    pub session_id: Uuid,
    pub max_poll_attempts: u32,
    pub poll_interval_ms: u64,
}

/// Poll response: progress while running, progress + result on the first
/// terminal poll.
#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub status: SessionStatus,
    pub steps: Vec<String>,
    pub reasoning: String,
    pub widget_notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
}
