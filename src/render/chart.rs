//! Inline SVG bar charts.

use std::fmt::Write;

use super::{escape_html, format_number};
use crate::models::Series;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 320.0;
const MARGIN_TOP: f64 = 24.0;
const MARGIN_BOTTOM: f64 = 56.0;
const MARGIN_SIDE: f64 = 16.0;

const PALETTE: [&str; 8] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3", "#ff6692", "#b6e880",
];

/// Render one series as a bar chart, one colored bar per entity.
pub fn bar_chart(series: &Series) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<figure class="chart"><figcaption>{}</figcaption><svg viewBox="0 0 {} {}" role="img" aria-label="{}">"#,
        escape_html(&series.title),
        WIDTH,
        HEIGHT,
        escape_html(&series.label)
    );

    if series.points.is_empty() {
        let _ = write!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle">No data</text>"#,
            WIDTH / 2.0,
            HEIGHT / 2.0
        );
        svg.push_str("</svg></figure>");
        return svg;
    }

    let max = series
        .points
        .iter()
        .map(|p| p.value)
        .fold(0.0_f64, f64::max);
    let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let slot = (WIDTH - 2.0 * MARGIN_SIDE) / series.points.len() as f64;
    let bar_width = slot * 0.7;
    let baseline = HEIGHT - MARGIN_BOTTOM;

    for (i, point) in series.points.iter().enumerate() {
        let height = if max > 0.0 {
            (point.value.max(0.0) / max) * plot_height
        } else {
            0.0
        };
        let x = MARGIN_SIDE + i as f64 * slot + (slot - bar_width) / 2.0;
        let y = baseline - height;
        let center = x + bar_width / 2.0;
        let color = PALETTE[i % PALETTE.len()];

        let _ = write!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{}: {}</title></rect>"#,
            x,
            y,
            bar_width,
            height,
            color,
            escape_html(&point.entity),
            format_number(point.value)
        );
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" class="value">{}</text>"#,
            center,
            y - 4.0,
            format_number(point.value)
        );
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" class="tick">{}</text>"#,
            center,
            baseline + 18.0,
            escape_html(&point.entity)
        );
    }

    let _ = write!(
        svg,
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>"#,
        MARGIN_SIDE,
        baseline,
        WIDTH - MARGIN_SIDE,
        baseline
    );
    svg.push_str("</svg></figure>");
    svg
}
