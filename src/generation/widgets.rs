//! Wire widget builders for the dashboard store platform.
//!
//! Each builder renders one widget kind into the JSON shape the remote
//! platform expects: a named widget with dataset queries and a versioned
//! `spec` block carrying encodings.

use rand::Rng;
use serde_json::{json, Value};

use super::types::{
    Aggregation, BarChartSpec, ColumnInfo, CounterSpec, LineChartSpec, PieChartSpec, PivotSpec,
};

/// Random 8-char lowercase alphanumeric widget name. Names never affect
/// placement.
pub fn random_name() -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..8)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

/// "resolution_time" -> "Resolution Time"
fn humanize(column: &str) -> String {
    column
        .split('_')
        .filter(|s| !s.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Field name and SQL expression for an aggregated column. `NONE` renders as
/// `MEASURE()` for pre-aggregated metric-view columns.
fn aggregated_field(aggregation: Aggregation, column: &str) -> (String, String) {
    let field = format!("{}({column})", aggregation.field_prefix());
    let expression = match aggregation {
        Aggregation::None => format!("MEASURE(`{column}`)"),
        other => format!("{}(`{column}`)", other.sql_name()),
    };
    (field, expression)
}

fn frame(title: &str) -> Value {
    json!({"showTitle": true, "title": title})
}

pub fn counter(spec: &CounterSpec, dataset_name: &str) -> Value {
    let (field, expression) = aggregated_field(spec.aggregation, &spec.value_column);
    let title = spec.label.clone().unwrap_or_else(|| {
        format!(
            "{} {}",
            spec.aggregation.title_prefix(),
            humanize(&spec.value_column)
        )
        .trim()
        .to_string()
    });

    json!({
        "name": random_name(),
        "queries": [{
            "name": "main_query",
            "query": {
                "datasetName": dataset_name,
                "fields": [{"name": field, "expression": expression}],
                "disaggregated": false
            }
        }],
        "spec": {
            "version": 2,
            "widgetType": "counter",
            "encodings": {"value": {"fieldName": field}},
            "frame": frame(&title)
        }
    })
}

pub fn filter(column: &str, dataset_name: &str) -> Value {
    let query_name = format!("datasets/{dataset_name}_{column}");

    json!({
        "name": format!("filter_{}", column.to_lowercase()),
        "queries": [{
            "name": query_name,
            "query": {
                "datasetName": dataset_name,
                "fields": [
                    {"name": column, "expression": format!("`{column}`")},
                    {
                        "name": format!("{column}_associativity"),
                        "expression": "COUNT_IF(`associative_filter_predicate_group`)"
                    }
                ],
                "disaggregated": false
            }
        }],
        "spec": {
            "version": 2,
            "widgetType": "filter-single-select",
            "encodings": {
                "fields": [{"fieldName": column, "queryName": query_name}]
            },
            "frame": {"showTitle": true}
        }
    })
}

/// Coarse display typing for table columns, preferring the data source's
/// declared types over name heuristics.
fn column_display(column: &str, column_types: Option<&[ColumnInfo]>) -> (&'static str, &'static str, &'static str) {
    if let Some(types) = column_types {
        if let Some(info) = types.iter().find(|c| c.name == column) {
            let t = info.col_type.to_lowercase();
            if t.contains("timestamp") || t.contains("date") {
                return ("datetime", "datetime", "right");
            }
            if ["bigint", "int", "smallint", "tinyint", "long"]
                .iter()
                .any(|n| t.contains(n))
            {
                return ("integer", "number", "right");
            }
            if ["double", "float", "decimal"].iter().any(|n| t.contains(n)) {
                return ("float", "number", "right");
            }
            return ("string", "string", "left");
        }
    }
    let lower = column.to_lowercase();
    if ["time", "date", "created", "updated"]
        .iter()
        .any(|k| lower.contains(k))
    {
        ("datetime", "datetime", "right")
    } else if lower.contains("id") {
        ("integer", "number", "right")
    } else {
        ("string", "string", "left")
    }
}

pub fn table(
    title: &str,
    visible_columns: &[String],
    dataset_name: &str,
    all_columns: &[String],
    column_types: Option<&[ColumnInfo]>,
) -> Value {
    let columns: Vec<Value> = visible_columns
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let (col_type, display_as, align) = column_display(col, column_types);
            json!({
                "fieldName": col,
                "type": col_type,
                "displayAs": display_as,
                "alignContent": align,
                "visible": true,
                "order": 100_000 + idx,
                "title": col
            })
        })
        .collect();

    let invisible: Vec<Value> = all_columns
        .iter()
        .filter(|col| !visible_columns.contains(col))
        .enumerate()
        .map(|(idx, col)| {
            let (col_type, display_as, align) = column_display(col, column_types);
            json!({
                "name": col,
                "type": col_type,
                "displayAs": display_as,
                "alignContent": align,
                "order": 100_000 + visible_columns.len() + idx,
                "title": col
            })
        })
        .collect();

    json!({
        "name": format!("table_{}", title.replace(' ', "_").to_lowercase()),
        "queries": [{
            "name": "main_query",
            "query": {
                "datasetName": dataset_name,
                "fields": visible_columns
                    .iter()
                    .map(|col| json!({"name": col, "expression": format!("`{col}`")}))
                    .collect::<Vec<_>>(),
                "disaggregated": true
            }
        }],
        "spec": {
            "version": 1,
            "widgetType": "table",
            "encodings": {"columns": columns},
            "invisibleColumns": invisible,
            "allowHTMLByDefault": false,
            "itemsPerPage": 25,
            "paginationSize": "default",
            "condensed": true,
            "withRowNumber": false
        }
    })
}

pub fn bar_chart(spec: &BarChartSpec, dataset_name: &str) -> Value {
    let (agg_field, agg_expression) = aggregated_field(spec.aggregation, &spec.x_column);
    let title = spec.title.clone().unwrap_or_else(|| {
        format!(
            "{} {} by {}",
            chart_title_prefix(spec.aggregation),
            humanize(&spec.x_column),
            humanize(&spec.y_column)
        )
        .trim()
        .to_string()
    });

    let mut fields = vec![
        json!({"name": spec.y_column, "expression": format!("`{}`", spec.y_column)}),
        json!({"name": agg_field, "expression": agg_expression}),
    ];
    let mut encodings = json!({
        "x": {"fieldName": agg_field, "scale": {"type": "quantitative"}},
        "y": {"fieldName": spec.y_column, "scale": {"type": "categorical"}}
    });
    if let Some(color) = &spec.color_column {
        encodings["color"] = json!({"fieldName": color, "scale": {"type": "categorical"}});
        if color != &spec.y_column {
            fields.insert(
                1,
                json!({"name": color, "expression": format!("`{color}`")}),
            );
        }
    }

    json!({
        "name": format!("bar_{}_{}", spec.y_column, spec.x_column).to_lowercase(),
        "queries": [{
            "name": "main_query",
            "query": {"datasetName": dataset_name, "fields": fields, "disaggregated": false}
        }],
        "spec": {
            "version": 3,
            "widgetType": "bar",
            "encodings": encodings,
            "frame": frame(&title)
        }
    })
}

pub fn line_chart(spec: &LineChartSpec, dataset_name: &str) -> Value {
    let granularity = spec.time_granularity.sql_name();
    let time_field = format!("{}({})", granularity.to_lowercase(), spec.x_column);
    let time_expression = format!("DATE_TRUNC(\"{granularity}\", `{}`)", spec.x_column);
    let (agg_field, agg_expression) = aggregated_field(spec.aggregation, &spec.y_column);
    let title = spec.title.clone().unwrap_or_else(|| {
        format!(
            "{} {} Over Time",
            chart_title_prefix(spec.aggregation),
            humanize(&spec.y_column)
        )
        .trim()
        .to_string()
    });

    let mut fields = vec![
        json!({"name": time_field, "expression": time_expression}),
        json!({"name": agg_field, "expression": agg_expression}),
    ];
    let mut encodings = json!({
        "x": {"fieldName": time_field, "scale": {"type": "temporal"}},
        "y": {"fieldName": agg_field, "scale": {"type": "quantitative"}}
    });
    if let Some(color) = &spec.color_column {
        encodings["color"] = json!({"fieldName": color, "scale": {"type": "categorical"}});
        fields.insert(
            1,
            json!({"name": color, "expression": format!("`{color}`")}),
        );
    }

    json!({
        "name": format!("line_{}_{}", spec.x_column, spec.y_column).to_lowercase(),
        "queries": [{
            "name": "main_query",
            "query": {"datasetName": dataset_name, "fields": fields, "disaggregated": false}
        }],
        "spec": {
            "version": 3,
            "widgetType": "line",
            "encodings": encodings,
            "frame": frame(&title)
        }
    })
}

pub fn pie_chart(spec: &PieChartSpec, dataset_name: &str) -> Value {
    let (value_field, value_expression) = aggregated_field(spec.aggregation, &spec.value_column);
    let title = spec.title.clone().unwrap_or_else(|| {
        format!(
            "{} {} by {}",
            spec.aggregation.title_prefix(),
            humanize(&spec.value_column),
            humanize(&spec.category_column)
        )
        .trim()
        .to_string()
    });

    json!({
        "name": random_name(),
        "queries": [{
            "name": "main_query",
            "query": {
                "datasetName": dataset_name,
                "fields": [
                    {"name": value_field, "expression": value_expression},
                    {
                        "name": spec.category_column,
                        "expression": format!("`{}`", spec.category_column)
                    }
                ],
                "disaggregated": false
            }
        }],
        "spec": {
            "version": 3,
            "widgetType": "pie",
            "encodings": {
                "angle": {"fieldName": value_field, "scale": {"type": "quantitative"}},
                "color": {"fieldName": spec.category_column, "scale": {"type": "categorical"}}
            },
            "frame": frame(&title)
        }
    })
}

pub fn pivot(spec: &PivotSpec, dataset_name: &str) -> Value {
    let (agg_field, agg_expression) = aggregated_field(spec.aggregation, &spec.value_column);
    let title = spec.title.clone().unwrap_or_else(|| {
        let rows = spec
            .row_columns
            .iter()
            .map(|c| humanize(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} {} by {rows}",
            chart_title_prefix(spec.aggregation),
            humanize(&spec.value_column)
        )
        .trim()
        .to_string()
    });

    let mut fields: Vec<Value> = spec
        .row_columns
        .iter()
        .map(|col| json!({"name": col, "expression": format!("`{col}`")}))
        .collect();
    fields.push(json!({"name": agg_field, "expression": agg_expression}));

    let name_cols = spec
        .row_columns
        .iter()
        .take(2)
        .cloned()
        .collect::<Vec<_>>()
        .join("_");

    json!({
        "name": format!("pivot_{name_cols}").to_lowercase(),
        "queries": [{
            "name": "main_query",
            "query": {
                "datasetName": dataset_name,
                "fields": fields,
                "cubeGroupingSets": {
                    "sets": [{"fieldNames": spec.row_columns}, {}]
                },
                "disaggregated": false,
                "orders": [{
                    "direction": "ASC",
                    "expression": format!("`{}`", spec.row_columns[0])
                }]
            }
        }],
        "spec": {
            "version": 3,
            "widgetType": "pivot",
            "encodings": {
                "rows": spec
                    .row_columns
                    .iter()
                    .map(|col| json!({"fieldName": col}))
                    .collect::<Vec<_>>(),
                "cell": {
                    "type": "multi-cell",
                    "fields": [{"fieldName": agg_field, "cellType": "text"}]
                }
            },
            "frame": frame(&title)
        }
    })
}

/// Empty text widget used as a visual spacer between widget groups.
pub fn spacer() -> Value {
    json!({
        "name": random_name(),
        "multilineTextboxSpec": {"lines": [""]}
    })
}

fn chart_title_prefix(aggregation: Aggregation) -> &'static str {
    match aggregation {
        Aggregation::Count => "Count",
        Aggregation::Sum => "Total",
        Aggregation::Avg => "Average",
        Aggregation::Max => "Maximum",
        Aggregation::Min => "Minimum",
        Aggregation::None => "",
    }
}
