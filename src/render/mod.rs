//! Presentation adapters.
//!
//! Turn a [`Dashboard`](crate::pipeline::Dashboard) into HTML or plain text.
//! Nothing here computes scores or ranks.

pub mod chart;
pub mod html;

use std::fmt::Write;

use crate::models::{Mode, RankedRow};

pub use html::{render_page, PageView};

/// Escape text for HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Whole numbers without decimals, anything else with two.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Column headers of the leaderboard table.
pub fn table_headers(mode: Mode) -> [String; 6] {
    [
        "Rank".to_string(),
        "Entity".to_string(),
        format!("{} OPS Score", mode),
        format!("{} Applications", mode),
        format!("{} Approvals", mode),
        format!("{} MoUs", mode),
    ]
}

fn table_cells(row: &RankedRow) -> [String; 6] {
    [
        row.rank.to_string(),
        row.label.clone(),
        format_number(row.row.score),
        format_number(row.row.applications),
        format_number(row.row.approvals),
        format_number(row.row.units),
    ]
}

/// Fixed-width text table for terminals.
pub fn text_table(rows: &[RankedRow], mode: Mode) -> String {
    let headers = table_headers(mode);
    let cells: Vec<[String; 6]> = rows.iter().map(table_cells).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut line = |cols: &[String]| {
        let padded: Vec<String> = cols
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  ").trim_end());
    };

    line(&headers);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    line(&rule);
    for row in &cells {
        line(row);
    }
    out
}
