//! One refresh cycle: fetch, check, aggregate, rank.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::calculate::{self, AggregationReport};
use crate::fetch::{DataSource, FetchError};
use crate::models::{
    ColumnMap, FunctionRow, Metric, Mode, RankedRow, SchemaError, Series, Summary, Table,
};

/// Errors that end a refresh cycle.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to load data: {0}")]
    Fetch(#[from] FetchError),

    #[error("Sheet does not match the expected layout: {0}")]
    Schema(#[from] SchemaError),
}

/// Everything the presentation layer needs for one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub mode: Mode,
    pub generated_at: DateTime<Utc>,
    pub source_rows: usize,
    pub leaderboard: Vec<RankedRow>,
    pub summary: Summary,
    pub series: Vec<Series>,
    pub functions: Vec<String>,
    pub report: AggregationReport,
    /// Hash of the ranked rows; equal for equal inputs.
    pub fingerprint: String,
    #[serde(skip)]
    table: Arc<Table>,
    #[serde(skip)]
    columns: ColumnMap,
}

impl Dashboard {
    pub fn series_for(&self, metric: Metric) -> Option<&Series> {
        self.series.iter().find(|s| s.metric == metric)
    }

    /// Per-entity numbers for one function, `None` if the sheet has no such function.
    pub fn function_breakdown(&self, function: &str) -> Option<Vec<FunctionRow>> {
        if !self.functions.iter().any(|f| f == function) {
            return None;
        }
        Some(calculate::functional_breakdown(
            &self.table,
            &self.columns,
            function,
        ))
    }
}

/// Short stable digest of the ranked rows.
pub fn fingerprint(rows: &[RankedRow]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        // RankedRow only holds strings and numbers, serialization cannot fail
        if let Ok(bytes) = serde_json::to_vec(row) {
            hasher.update(&bytes);
        }
        hasher.update(b"\n");
    }
    hex::encode(&hasher.finalize()[..8])
}

/// Build a dashboard from a snapshot.
pub fn build_dashboard(table: Arc<Table>, columns: &ColumnMap) -> Result<Dashboard, SchemaError> {
    table.require_columns(&columns.required_columns())?;

    let (aggregates, report) = calculate::aggregate_measures(&table, columns);
    let combined = calculate::combine(&aggregates);
    let summary = calculate::summarize(&combined);
    let series = Metric::ALL
        .iter()
        .map(|m| calculate::series(&combined, *m, columns.mode))
        .collect();
    let leaderboard = calculate::rank_rows(combined);
    let functions = if table.has_column(&columns.function) {
        calculate::functions(&table, columns)
    } else {
        Vec::new()
    };

    if report.coerced_cells > 0 || report.skipped_rows > 0 {
        warn!(
            "Normalized sheet data: {} non-numeric cell(s) read as 0, {} row(s) without an entity skipped",
            report.coerced_cells, report.skipped_rows
        );
    }

    Ok(Dashboard {
        mode: columns.mode,
        generated_at: Utc::now(),
        source_rows: table.len(),
        fingerprint: fingerprint(&leaderboard),
        leaderboard,
        summary,
        series,
        functions,
        report,
        table,
        columns: columns.clone(),
    })
}

/// Fetch a snapshot and build its dashboard.
pub async fn run_cycle(
    source: &dyn DataSource,
    columns: &ColumnMap,
) -> Result<Dashboard, PipelineError> {
    let table = source.fetch().await?;
    let dashboard = build_dashboard(table, columns)?;

    info!(
        "Leaderboard built from {} '{}' rows: {} entities (fingerprint {})",
        dashboard.source_rows,
        source.name(),
        dashboard.leaderboard.len(),
        dashboard.fingerprint
    );

    Ok(dashboard)
}
