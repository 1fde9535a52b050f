//! Deterministic widget-layout synthesis.
//!
//! Converts a validated [`WidgetPlan`] into concrete, non-overlapping grid
//! placements on a 6-column canvas. Placement depends only on the plan;
//! generated widget names are random but never affect positions.

use serde_json::Value;

use super::types::{ColumnInfo, GridRect, LayoutItem, WidgetPlan};
use super::widgets;

const COUNTER_SIZE: i32 = 2;
const CHART_HEIGHT: i32 = 6;
const TABLE_HEIGHT: i32 = 8;

/// Placements plus the human-readable widget summary recorded in the session
/// result.
#[derive(Debug, Default)]
pub struct LayoutOutcome {
    pub items: Vec<LayoutItem>,
    pub summaries: Vec<String>,
}

impl LayoutOutcome {
    fn place(&mut self, widget: Value, x: i32, y: i32, width: i32, height: i32) {
        self.items.push(LayoutItem {
            widget,
            position: GridRect::new(x, y, width, height),
        });
    }

    fn spacer(&mut self, y: i32) {
        self.place(widgets::spacer(), 0, y, 6, 1);
    }
}

/// Pure layout synthesis. Fixed sizes per widget kind, chart kinds placed in
/// priority order bar, line, pie, pivot.
pub fn synthesize(
    plan: &WidgetPlan,
    dataset_name: &str,
    all_columns: &[String],
    column_types: Option<&[ColumnInfo]>,
    metric_view: bool,
) -> LayoutOutcome {
    let mut out = LayoutOutcome::default();

    // Filter always claims the top-left corner.
    let has_filter = if let Some(filter) = &plan.filter {
        out.place(widgets::filter(&filter.column, dataset_name), 0, 0, 2, 2);
        out.summaries.push(format!("Filter on {}", filter.column));
        true
    } else {
        false
    };

    // Counters: exactly 3 go in one row below the filter; otherwise 2 per
    // row starting at x=2, leaving the filter column free.
    let num_counters = plan.counters.len();
    for (idx, counter) in plan.counters.iter().enumerate() {
        let (x, y) = if num_counters == 3 {
            ((idx as i32) * COUNTER_SIZE, 2)
        } else {
            (
                2 + ((idx as i32) % 2) * COUNTER_SIZE,
                ((idx as i32) / 2) * COUNTER_SIZE,
            )
        };
        let widget = widgets::counter(counter, dataset_name);
        let label = widget["spec"]["frame"]["title"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        out.place(widget, x, y, COUNTER_SIZE, COUNTER_SIZE);
        out.summaries.push(format!("Counter: {label}"));
    }
    let counter_rows: i32 = if num_counters == 3 {
        2
    } else {
        ((num_counters as i32) + 1) / 2
    };

    let filter_height = if has_filter { 2 } else { 0 };
    let mut current_y = filter_height.max(counter_rows * 2);

    if has_filter || num_counters > 0 {
        out.spacer(current_y);
        current_y += 1;
    }

    // Table is prepared here but placed last, below the charts.
    let table = plan.table.as_ref().map(|table| {
        let mut columns = table.columns.clone();
        if metric_view {
            if let Some(types) = column_types {
                // Measure columns need aggregation context and cannot appear
                // in record-level tables.
                columns.retain(|col| {
                    types
                        .iter()
                        .find(|c| &c.name == col)
                        .map(|c| !c.is_measure)
                        .unwrap_or(true)
                });
            }
        }
        let widget = widgets::table(
            "Data Overview",
            &columns,
            dataset_name,
            all_columns,
            column_types,
        );
        out.summaries
            .push(format!("Table with {} columns", columns.len()));
        widget
    });

    let mut charts: Vec<Value> = Vec::new();
    if let Some(bar) = &plan.bar_chart {
        out.summaries.push(format!(
            "Bar chart: {} of {} by {}",
            bar.aggregation.sql_name(),
            bar.x_column,
            bar.y_column
        ));
        charts.push(widgets::bar_chart(bar, dataset_name));
    }
    if let Some(line) = &plan.line_chart {
        out.summaries.push(format!(
            "Line chart: {} of {} over {}",
            line.aggregation.sql_name(),
            line.y_column,
            line.x_column
        ));
        charts.push(widgets::line_chart(line, dataset_name));
    }
    if let Some(pie) = &plan.pie_chart {
        out.summaries.push(format!(
            "Pie chart: {} of {} by {}",
            pie.aggregation.sql_name(),
            pie.value_column,
            pie.category_column
        ));
        charts.push(widgets::pie_chart(pie, dataset_name));
    }
    if let Some(pivot) = &plan.pivot {
        out.summaries.push(format!(
            "Pivot: {} of {} by {}",
            pivot.aggregation.sql_name(),
            pivot.value_column,
            pivot.row_columns.join(", ")
        ));
        charts.push(widgets::pivot(pivot, dataset_name));
    }

    let num_charts = charts.len();
    let mut charts = charts.into_iter();
    match num_charts {
        0 => {}
        1 | 2 => {
            for (idx, chart) in charts.enumerate() {
                out.place(chart, (idx as i32 % 2) * 3, current_y, 3, CHART_HEIGHT);
            }
            current_y += CHART_HEIGHT;
        }
        3 => {
            // Hero layout: first chart full width, remaining two split below.
            if let Some(hero) = charts.next() {
                out.place(hero, 0, current_y, 6, CHART_HEIGHT);
            }
            current_y += CHART_HEIGHT;
            out.spacer(current_y);
            current_y += 1;
            for (idx, chart) in charts.enumerate() {
                out.place(chart, (idx as i32) * 3, current_y, 3, CHART_HEIGHT);
            }
            current_y += CHART_HEIGHT;
        }
        4 => {
            for (idx, chart) in charts.enumerate() {
                let row = (idx / 2) as i32;
                if idx == 2 {
                    out.spacer(current_y + CHART_HEIGHT);
                }
                out.place(
                    chart,
                    (idx as i32 % 2) * 3,
                    current_y + row * (CHART_HEIGHT + 1),
                    3,
                    CHART_HEIGHT,
                );
            }
            current_y += 2 * CHART_HEIGHT + 1;
        }
        _ => {
            // Standard 2-per-row grid with a spacer after every completed
            // row except the last.
            for (idx, chart) in charts.enumerate() {
                out.place(chart, (idx as i32 % 2) * 3, current_y, 3, CHART_HEIGHT);
                let end_of_row = idx % 2 == 1 || idx == num_charts - 1;
                if end_of_row {
                    current_y += CHART_HEIGHT;
                    if idx < num_charts - 1 {
                        out.spacer(current_y);
                        current_y += 1;
                    }
                }
            }
        }
    }

    if let Some(table_widget) = table {
        if num_charts > 0 {
            out.spacer(current_y);
            current_y += 1;
        }
        out.place(table_widget, 0, current_y, 6, TABLE_HEIGHT);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::types::{
        Aggregation, BarChartSpec, CounterSpec, FilterSpec, LineChartSpec, PieChartSpec,
        PivotSpec, TableSpec, TimeGranularity, GRID_WIDTH,
    };

    fn counter(column: &str) -> CounterSpec {
        CounterSpec {
            value_column: column.to_string(),
            aggregation: Aggregation::Count,
            label: None,
            reason: None,
        }
    }

    fn bar() -> BarChartSpec {
        BarChartSpec {
            x_column: "ticket_id".to_string(),
            y_column: "priority".to_string(),
            aggregation: Aggregation::Count,
            color_column: None,
            title: None,
            reason: None,
        }
    }

    fn line() -> LineChartSpec {
        LineChartSpec {
            x_column: "created_time".to_string(),
            y_column: "ticket_id".to_string(),
            aggregation: Aggregation::Count,
            time_granularity: TimeGranularity::Month,
            color_column: None,
            title: None,
            reason: None,
        }
    }

    fn pie() -> PieChartSpec {
        PieChartSpec {
            value_column: "ticket_id".to_string(),
            aggregation: Aggregation::Count,
            category_column: "priority".to_string(),
            title: None,
            reason: None,
        }
    }

    fn pivot_spec() -> PivotSpec {
        PivotSpec {
            row_columns: vec!["priority".to_string()],
            value_column: "ticket_id".to_string(),
            aggregation: Aggregation::Count,
            title: None,
            reason: None,
        }
    }

    fn columns() -> Vec<String> {
        vec![
            "ticket_id".to_string(),
            "priority".to_string(),
            "created_time".to_string(),
        ]
    }

    fn synthesize_plan(plan: &WidgetPlan) -> LayoutOutcome {
        synthesize(plan, "ds1", &columns(), None, false)
    }

    fn positions(outcome: &LayoutOutcome) -> Vec<GridRect> {
        outcome.items.iter().map(|i| i.position).collect()
    }

    #[test]
    fn every_rectangle_stays_in_bounds() {
        let plans = [
            WidgetPlan {
                filter: Some(FilterSpec {
                    column: "priority".to_string(),
                    reason: None,
                }),
                counters: vec![counter("ticket_id"), counter("priority"), counter("created_time")],
                bar_chart: Some(bar()),
                line_chart: Some(line()),
                pie_chart: Some(pie()),
                pivot: Some(pivot_spec()),
                table: Some(TableSpec {
                    columns: columns(),
                    reason: None,
                }),
                ..Default::default()
            },
            WidgetPlan {
                counters: vec![counter("ticket_id"); 5],
                line_chart: Some(line()),
                ..Default::default()
            },
        ];
        for plan in &plans {
            for item in synthesize_plan(plan).items {
                assert!(
                    item.position.in_bounds(),
                    "out of bounds: {:?}",
                    item.position
                );
                assert!(item.position.x + item.position.width <= GRID_WIDTH);
            }
        }
    }

    #[test]
    fn placement_is_deterministic() {
        let plan = WidgetPlan {
            filter: Some(FilterSpec {
                column: "priority".to_string(),
                reason: None,
            }),
            counters: vec![counter("ticket_id"), counter("priority")],
            bar_chart: Some(bar()),
            line_chart: Some(line()),
            table: Some(TableSpec {
                columns: columns(),
                reason: None,
            }),
            ..Default::default()
        };
        assert_eq!(
            positions(&synthesize_plan(&plan)),
            positions(&synthesize_plan(&plan))
        );
    }

    #[test]
    fn three_counters_share_one_row_below_filter() {
        let plan = WidgetPlan {
            filter: Some(FilterSpec {
                column: "priority".to_string(),
                reason: None,
            }),
            counters: vec![counter("a"), counter("b"), counter("c")],
            ..Default::default()
        };
        let outcome = synthesize_plan(&plan);
        let counter_rects: Vec<GridRect> = outcome.items[1..4]
            .iter()
            .map(|i| i.position)
            .collect();
        assert_eq!(
            counter_rects,
            vec![
                GridRect::new(0, 2, 2, 2),
                GridRect::new(2, 2, 2, 2),
                GridRect::new(4, 2, 2, 2),
            ]
        );
    }

    #[test]
    fn three_charts_use_hero_layout() {
        let plan = WidgetPlan {
            bar_chart: Some(bar()),
            line_chart: Some(line()),
            pie_chart: Some(pie()),
            ..Default::default()
        };
        let outcome = synthesize_plan(&plan);
        let rects = positions(&outcome);
        assert_eq!(rects[0], GridRect::new(0, 0, 6, 6));
        // Spacer row between the hero chart and the split row.
        assert_eq!(rects[1], GridRect::new(0, 6, 6, 1));
        assert_eq!(rects[2], GridRect::new(0, 7, 3, 6));
        assert_eq!(rects[3], GridRect::new(3, 7, 3, 6));
    }

    #[test]
    fn four_charts_form_two_rows_with_spacer() {
        let plan = WidgetPlan {
            bar_chart: Some(bar()),
            line_chart: Some(line()),
            pie_chart: Some(pie()),
            pivot: Some(pivot_spec()),
            ..Default::default()
        };
        let rects = positions(&synthesize_plan(&plan));
        assert_eq!(rects[0], GridRect::new(0, 0, 3, 6));
        assert_eq!(rects[1], GridRect::new(3, 0, 3, 6));
        assert_eq!(rects[2], GridRect::new(0, 6, 6, 1));
        assert_eq!(rects[3], GridRect::new(0, 7, 3, 6));
        assert_eq!(rects[4], GridRect::new(3, 7, 3, 6));
    }

    #[test]
    fn chart_priority_order_is_bar_line_pie_pivot() {
        let plan = WidgetPlan {
            pivot: Some(pivot_spec()),
            pie_chart: Some(pie()),
            line_chart: Some(line()),
            bar_chart: Some(bar()),
            ..Default::default()
        };
        let outcome = synthesize_plan(&plan);
        let kinds: Vec<&str> = outcome
            .items
            .iter()
            .filter_map(|i| i.widget_type())
            .filter(|t| *t != "table")
            .collect();
        assert_eq!(kinds, vec!["bar", "line", "pie", "pivot"]);
    }

    #[test]
    fn counter_and_line_chart_scenario() {
        // "ticket volume by priority over time" without a filter: counter at
        // (2,0,2,2), spacer, line chart directly below.
        let plan = WidgetPlan {
            counters: vec![counter("ticket_id")],
            line_chart: Some(line()),
            ..Default::default()
        };
        let outcome = synthesize_plan(&plan);
        assert_eq!(outcome.items[0].position, GridRect::new(2, 0, 2, 2));
        assert_eq!(outcome.items[0].widget_type(), Some("counter"));
        assert_eq!(outcome.items[1].position, GridRect::new(0, 2, 6, 1));
        assert_eq!(outcome.items[2].position, GridRect::new(0, 3, 3, 6));
        assert_eq!(outcome.items[2].widget_type(), Some("line"));
    }

    #[test]
    fn empty_plan_produces_no_items() {
        let outcome = synthesize_plan(&WidgetPlan::default());
        assert!(outcome.items.is_empty());
        assert!(outcome.summaries.is_empty());
    }

    #[test]
    fn table_lands_at_the_bottom_full_width() {
        let plan = WidgetPlan {
            bar_chart: Some(bar()),
            table: Some(TableSpec {
                columns: vec!["ticket_id".to_string()],
                reason: None,
            }),
            ..Default::default()
        };
        let outcome = synthesize_plan(&plan);
        let table = outcome.items.last().unwrap();
        assert_eq!(table.widget_type(), Some("table"));
        // Chart (6 tall) then spacer then table.
        assert_eq!(table.position, GridRect::new(0, 7, 6, 8));
    }

    #[test]
    fn metric_view_table_drops_measure_columns() {
        let types = vec![
            ColumnInfo {
                name: "region".to_string(),
                col_type: "string".to_string(),
                is_measure: false,
            },
            ColumnInfo {
                name: "total_revenue".to_string(),
                col_type: "double".to_string(),
                is_measure: true,
            },
        ];
        let plan = WidgetPlan {
            table: Some(TableSpec {
                columns: vec!["region".to_string(), "total_revenue".to_string()],
                reason: None,
            }),
            ..Default::default()
        };
        let outcome = synthesize(
            &plan,
            "ds1",
            &["region".to_string(), "total_revenue".to_string()],
            Some(&types),
            true,
        );
        assert!(outcome
            .summaries
            .iter()
            .any(|s| s == "Table with 1 columns"));
        let table = outcome.items.last().unwrap();
        let fields = table.widget["queries"][0]["query"]["fields"]
            .as_array()
            .unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0]["name"], "region");
    }

    #[test]
    fn layout_never_ends_with_a_spacer() {
        let plan = WidgetPlan {
            bar_chart: Some(bar()),
            line_chart: Some(line()),
            pie_chart: Some(pie()),
            pivot: Some(pivot_spec()),
            ..Default::default()
        };
        let outcome = synthesize_plan(&plan);
        let last = outcome.items.last().unwrap();
        assert_ne!(last.position.height, 1, "layout must not end with a spacer");
    }
}
