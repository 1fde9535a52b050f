//! Prompt construction for the widget-planning step.

use super::types::ColumnInfo;

/// Builds the system prompt describing available columns, aggregation rules,
/// and the strict JSON plan contract. Metric views flip the measure/dimension
/// rules: measures are pre-aggregated and take aggregation `NONE`.
pub fn plan_system_prompt(
    all_columns: &[String],
    column_types: Option<&[ColumnInfo]>,
    metric_view: bool,
) -> String {
    let columns_info = match column_types {
        Some(types) if !types.is_empty() => {
            let with_types = types
                .iter()
                .map(|c| format!("{} ({})", c.name, c.col_type))
                .collect::<Vec<_>>()
                .join(", ");
            let measures: Vec<&str> = types
                .iter()
                .filter(|c| c.is_measure)
                .map(|c| c.name.as_str())
                .collect();
            let dimensions: Vec<&str> = types
                .iter()
                .filter(|c| !c.is_measure)
                .map(|c| c.name.as_str())
                .collect();

            if metric_view && !measures.is_empty() {
                format!(
                    "THIS IS A METRIC VIEW - SPECIAL RULES APPLY\n\n\
                     Available columns with types: {with_types}\n\n\
                     MEASURE COLUMNS (pre-aggregated): {}\n\
                     - These are ALREADY aggregated metrics. Use aggregation \"NONE\" for them in counters and charts; MEASURE() is applied automatically.\n\
                     - NEVER use SUM/AVG/MAX/MIN on measure columns.\n\
                     DIMENSION COLUMNS (for grouping): {}\n\
                     - Use these for filtering, grouping (y_column, category_column, color_column, row_columns) and COUNT aggregations.\n\
                     - Table widgets may ONLY contain dimension columns, never measure columns.",
                    measures.join(", "),
                    dimensions.join(", ")
                )
            } else {
                format!(
                    "Available columns with types: {with_types}\n\n\
                     Use the column types to decide which columns to use:\n\
                     - NUMERICAL types (bigint, double, decimal, int, float): valid for SUM/AVG/MAX/MIN aggregations.\n\
                     - TIMESTAMP/DATE types: the ONLY valid line-chart x_column (DATE_TRUNC is applied with the time granularity).\n\
                     - INT/BIGINT columns named month, year or day are numeric IDs, NOT timestamps; use them as bar-chart categories, never with time_granularity.\n\
                     - STRING/CATEGORICAL types: grouping, filtering, and COUNT-only aggregations."
                )
            }
        }
        _ => format!("Available columns: {}", all_columns.join(", ")),
    };

    format!(
        "You are a data dashboard expert. Design a visually comfortable, well-organized dashboard for the user's request.\n\n\
         Plan first: pick 4-8 widgets that answer the request, KPIs at the top, trend and comparison charts in the middle, detailed tables at the bottom. A filter widget, when useful, always sits top-left.\n\n\
         {columns_info}\n\n\
         Respond with JSON only, in exactly this structure:\n\
         {{\n\
           \"reasoning\": \"numbered explanation: (1) what the user needs (2) which widgets you selected and why (3) the layout strategy\",\n\
           \"counters\": [{{\"value_column\": \"...\", \"aggregation\": \"COUNT|SUM|AVG|MAX|MIN|NONE\", \"label\": \"short business-friendly title\", \"reason\": \"why this KPI helps\"}}] or [],\n\
           \"filter\": {{\"column\": \"categorical_column\", \"reason\": \"...\"}} or null,\n\
           \"table\": {{\"columns\": [\"...\"], \"reason\": \"...\"}} or null,\n\
           \"bar_chart\": {{\"x_column\": \"column_to_aggregate\", \"y_column\": \"categorical_grouping_column\", \"aggregation\": \"...\", \"color_column\": \"optional_or_null\", \"title\": \"...\", \"reason\": \"...\"}} or null,\n\
           \"line_chart\": {{\"x_column\": \"timestamp_or_date_column\", \"y_column\": \"column_to_aggregate\", \"aggregation\": \"...\", \"time_granularity\": \"YEAR|QUARTER|MONTH|WEEK|DAY|HOUR\", \"color_column\": \"optional_or_null\", \"title\": \"...\", \"reason\": \"...\"}} or null,\n\
           \"pie_chart\": {{\"value_column\": \"...\", \"aggregation\": \"...\", \"category_column\": \"...\", \"title\": \"...\", \"reason\": \"...\"}} or null,\n\
           \"pivot\": {{\"row_columns\": [\"...\"], \"value_column\": \"...\", \"aggregation\": \"...\", \"title\": \"...\", \"reason\": \"...\"}} or null,\n\
           \"dashboard_name\": \"descriptive name\"\n\
         }}\n\n\
         Aggregation rules (all widgets):\n\
         - TEXT/CATEGORICAL columns can ONLY use COUNT. Columns like ticket_id, status or priority are categorical even when they look numeric.\n\
         - NUMERICAL columns (revenue, amount, duration) may use COUNT, SUM, AVG, MAX, MIN.\n\
         - Never use a timestamp column as a counter value_column.\n\
         - time_granularity and DATE_TRUNC apply ONLY to TIMESTAMP/DATE columns; check the type first.\n\n\
         Include only widgets relevant to the request; set the rest to null (or [] for counters). Counter labels are required and human-readable (\"Total Revenue\", never \"count(ticket_id)\")."
    )
}
