//! Dashboard page.

use std::fmt::Write;

use super::chart::bar_chart;
use super::{escape_html, format_number, table_cells, table_headers};
use crate::models::{FunctionRow, Metric, Mode, Series, SeriesPoint};
use crate::pipeline::Dashboard;
use crate::refresh::RefreshState;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1200px; padding: 16px; color: #31333f; }
h1 { text-align: center; }
.summary { display: flex; gap: 16px; justify-content: space-around; text-align: center; }
.summary .value { font-size: 32px; margin: 0; }
.error { background: #fde8e8; border: 1px solid #f5a3a3; padding: 12px; border-radius: 4px; }
table.leaderboard { width: 100%; border-collapse: collapse; }
table.leaderboard th, table.leaderboard td { font-size: 20px; padding: 10px; text-align: center; font-weight: 900; border: 1px solid #ddd; }
table.leaderboard thead th { background-color: green; color: white; }
.charts { display: grid; grid-template-columns: repeat(auto-fit, minmax(480px, 1fr)); gap: 16px; }
.chart figcaption { font-size: 20px; }
.chart .value, .chart .tick { font-size: 12px; fill: #31333f; }
.chart .axis { stroke: #aaa; }
footer { text-align: center; color: #777; margin-top: 24px; }
@media screen and (max-width: 768px) {
  table.leaderboard th, table.leaderboard td { font-size: 16px; padding: 8px; }
}
@media screen and (max-width: 480px) {
  table.leaderboard th, table.leaderboard td { font-size: 11px; padding: 6px; }
}
"#;

/// Inputs for one page render.
pub struct PageView<'a> {
    pub title: &'a str,
    pub mode: Mode,
    /// Seconds until the browser reloads the page
    pub refresh_seconds: u64,
    pub dashboard: Option<&'a Dashboard>,
    pub state: &'a RefreshState,
    /// Selected function for the breakdown section
    pub function: Option<&'a str>,
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(16 * 1024);
    let _ = write!(
        html,
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><meta http-equiv="refresh" content="{}"><title>{}</title><style>{}</style></head><body>"#,
        view.refresh_seconds,
        escape_html(view.title),
        STYLE
    );
    let _ = write!(html, "<h1>{}</h1><hr>", escape_html(view.title));

    if let Some(err) = &view.state.last_error {
        let _ = write!(
            html,
            r#"<div class="error" role="alert">Failed to load data: {}</div>"#,
            escape_html(err)
        );
    }

    match view.dashboard {
        Some(dashboard) => render_dashboard(&mut html, dashboard, view),
        None if view.state.last_error.is_none() => {
            html.push_str("<p>Loading data&hellip;</p>");
        }
        None => {}
    }

    html.push_str("</body></html>");
    html
}

fn render_dashboard(html: &mut String, dashboard: &Dashboard, view: &PageView<'_>) {
    let mode = view.mode;
    let summary = &dashboard.summary;

    html.push_str(r#"<section class="summary">"#);
    for (heading, value) in [
        (format!("🌍 {} Applications", mode), format_number(summary.total_applications)),
        (format!("✅ {} Approvals", mode), format_number(summary.total_approvals)),
        (format!("📊 {} MoUs", mode), format_number(summary.total_units)),
        (format!("🎯 {} Conversion", mode), format_number(summary.conversion_rate)),
    ] {
        let _ = write!(
            html,
            r#"<div><h3>{}</h3><p class="value">{}</p></div>"#,
            escape_html(&heading),
            value
        );
    }
    html.push_str("</section><hr>");

    let _ = write!(html, "<h2>🔥{} Leaderboard</h2>", mode);
    html.push_str(r#"<table class="leaderboard"><thead><tr>"#);
    for header in table_headers(mode) {
        let _ = write!(html, "<th>{}</th>", escape_html(&header));
    }
    html.push_str("</tr></thead><tbody>");
    for row in &dashboard.leaderboard {
        html.push_str("<tr>");
        for cell in table_cells(row) {
            let _ = write!(html, "<td>{}</td>", escape_html(&cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table><hr>");

    html.push_str(r#"<section class="charts">"#);
    for metric in [Metric::Applications, Metric::Approvals, Metric::Units, Metric::Ratio] {
        if let Some(series) = dashboard.series_for(metric) {
            html.push_str(&bar_chart(series));
        }
    }
    html.push_str("</section>");

    if !dashboard.functions.is_empty() {
        render_functions(html, dashboard, view);
    }

    let _ = write!(
        html,
        "<footer>Updated {} &middot; {} rows &middot; refreshes every {}s</footer>",
        dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        dashboard.source_rows,
        view.refresh_seconds
    );
}

fn render_functions(html: &mut String, dashboard: &Dashboard, view: &PageView<'_>) {
    let selected = view
        .function
        .filter(|f| dashboard.functions.iter().any(|name| name.as_str() == *f))
        .unwrap_or(dashboard.functions[0].as_str());

    html.push_str(r#"<hr><h2>Functional Analysis</h2><form method="get" action="/"><select name="function" onchange="this.form.submit()">"#);
    for name in &dashboard.functions {
        let _ = write!(
            html,
            r#"<option value="{0}"{1}>{0}</option>"#,
            escape_html(name),
            if name.as_str() == selected { " selected" } else { "" }
        );
    }
    html.push_str(r#"</select><noscript><button type="submit">Show</button></noscript></form>"#);

    let rows = dashboard.function_breakdown(selected).unwrap_or_default();
    html.push_str(r#"<section class="charts">"#);
    for series in function_series(&rows, view.mode, selected) {
        html.push_str(&bar_chart(&series));
    }
    html.push_str("</section>");
}

fn function_chart(
    rows: &[FunctionRow],
    metric: Metric,
    title: String,
    label: &str,
    value: fn(&FunctionRow) -> f64,
) -> Series {
    Series {
        metric,
        title,
        label: label.to_string(),
        points: rows
            .iter()
            .map(|r| SeriesPoint {
                entity: r.entity.clone(),
                value: value(r),
            })
            .collect(),
    }
}

fn function_series(rows: &[FunctionRow], mode: Mode, function: &str) -> Vec<Series> {
    vec![
        function_chart(
            rows,
            Metric::SignUps,
            format!("📩 {} Sign Ups by Entity for {} Function", mode, function),
            "Sign Ups",
            |r: &FunctionRow| r.sign_ups,
        ),
        function_chart(
            rows,
            Metric::Applications,
            format!("🌍 {} Applications by Entity for {} Function", mode, function),
            "Applications",
            |r: &FunctionRow| r.applications,
        ),
        function_chart(
            rows,
            Metric::Approvals,
            format!("✅ {} Approvals by Entity for {} Function", mode, function),
            "Approvals",
            |r: &FunctionRow| r.approvals,
        ),
        function_chart(
            rows,
            Metric::Ratio,
            format!(
                "📊 {} Applied to Approved Ratio by Entity for {} Function",
                mode, function
            ),
            "Applied to Approved Ratio",
            |r: &FunctionRow| r.ratio,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::parse_csv;
    use crate::models::ColumnMap;
    use crate::pipeline::build_dashboard;
    use std::sync::Arc;

    const SHEET: &str = "\
Entity,Function,Total Applied,Total Approved,Total MoUs,Total Total
CC,oGV,10,5,1,5
CN,iGTa,0,0,0,0
CC,iGTa,5,5,0,5
";

    fn dashboard() -> Dashboard {
        let table = Arc::new(parse_csv(SHEET.as_bytes()).unwrap());
        build_dashboard(table, &ColumnMap::default()).unwrap()
    }

    fn view<'a>(dashboard: Option<&'a Dashboard>, state: &'a RefreshState) -> PageView<'a> {
        PageView {
            title: "NLDS <2025>",
            mode: Mode::Total,
            refresh_seconds: 60,
            dashboard,
            state,
            function: None,
        }
    }

    #[test]
    fn test_page_contains_leaderboard() {
        let d = dashboard();
        let state = RefreshState::default();
        let html = render_page(&view(Some(&d), &state));

        assert!(html.contains(r#"<meta http-equiv="refresh" content="60">"#));
        assert!(html.contains("<title>NLDS &lt;2025&gt;</title>"));
        assert!(html.contains("<th>Total OPS Score</th>"));
        assert!(html.contains("<td>🥇 CC</td>"));
        assert!(html.contains("<td>-</td><td>CN</td>"));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn test_page_shows_error_alongside_last_good_data() {
        let d = dashboard();
        let state = RefreshState {
            last_error: Some("HTTP 500: Internal Server Error".to_string()),
            ..Default::default()
        };
        let html = render_page(&view(Some(&d), &state));

        assert!(html.contains("Failed to load data: HTTP 500"));
        assert!(html.contains("<td>🥇 CC</td>"));
    }

    #[test]
    fn test_page_error_without_data() {
        let state = RefreshState {
            last_error: Some("Missing required column(s): Entity".to_string()),
            ..Default::default()
        };
        let html = render_page(&view(None, &state));

        assert!(html.contains("Missing required column(s): Entity"));
        assert!(!html.contains("<table"));
        assert!(!html.contains("Loading"));
    }

    #[test]
    fn test_page_loading_state() {
        let state = RefreshState::default();
        let html = render_page(&view(None, &state));
        assert!(html.contains("Loading data"));
    }

    #[test]
    fn test_function_selection() {
        let d = dashboard();
        let state = RefreshState::default();
        let mut v = view(Some(&d), &state);
        v.function = Some("iGTa");
        let html = render_page(&v);

        assert!(html.contains(r#"<option value="iGTa" selected>iGTa</option>"#));
        assert!(html.contains("Approvals by Entity for iGTa Function"));
    }

    #[test]
    fn test_function_series_metrics() {
        let d = dashboard();
        let rows = d.function_breakdown("oGV").unwrap();
        let series = function_series(&rows, Mode::Total, "oGV");

        let metrics: Vec<Metric> = series.iter().map(|s| s.metric).collect();
        assert_eq!(
            metrics,
            vec![Metric::SignUps, Metric::Applications, Metric::Approvals, Metric::Ratio]
        );
        assert_eq!(series[0].label, "Sign Ups");
    }

    #[test]
    fn test_unknown_function_falls_back_to_first() {
        let d = dashboard();
        let state = RefreshState::default();
        let mut v = view(Some(&d), &state);
        v.function = Some("nope");
        let html = render_page(&v);

        assert!(html.contains(r#"<option value="oGV" selected>oGV</option>"#));
    }
}
