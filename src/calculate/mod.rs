//! Leaderboard calculation engine.
//!
//! Computes derived metrics from a sheet snapshot:
//! - Per-entity sums of each measure
//! - Applied to approved ratio
//! - Ranking with medals (see [`rank`])
//! - Per-function breakdown (see [`functions`])

pub mod functions;
pub mod rank;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{
    AggregateRow, ColumnMap, CombinedRow, Measure, Metric, Mode, Numeric, Record, Series,
    SeriesPoint, Summary, Table,
};

pub use functions::{functional_breakdown, functions};
pub use rank::{rank_and_merge, rank_rows};

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage `numerator / denominator`, rounded to 2 places.
/// Zero denominators and non-finite results yield 0.
pub fn ratio_value(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = round2(100.0 * numerator / denominator);
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Ratio per key for every key present in both inputs, in numerator order.
pub fn ratio(
    numerator_by_key: &IndexMap<String, f64>,
    denominator_by_key: &IndexMap<String, f64>,
) -> IndexMap<String, f64> {
    numerator_by_key
        .iter()
        .filter_map(|(key, num)| {
            denominator_by_key
                .get(key)
                .map(|den| (key.clone(), ratio_value(*num, *den)))
        })
        .collect()
}

/// Counts of cells and rows that needed normalizing while aggregating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
    /// Rows dropped because the entity cell was blank.
    pub skipped_rows: usize,
    /// Non-numeric cells read as zero.
    pub coerced_cells: usize,
}

/// Entity of a record, logging rows without one.
fn entity_of<'a>(record: &Record<'a>, column: &str) -> Option<&'a str> {
    let entity = record.text(column);
    if entity.is_none() {
        warn!("Skipping row {}: blank '{}' cell", record.line + 1, column);
    }
    entity
}

fn read_measure(record: &Record<'_>, column: &str, report: &mut AggregationReport) -> f64 {
    let numeric = record.numeric(column);
    if numeric == Numeric::Malformed {
        report.coerced_cells += 1;
        warn!(
            "Row {}: non-numeric value {:?} in '{}' read as 0",
            record.line + 1,
            record.get(column).unwrap_or_default(),
            column
        );
    }
    numeric.value()
}

/// Sum `measure_field` per `group_key_field`.
///
/// Keys appear in the order they are first seen, so downstream joins are
/// deterministic for a given snapshot.
pub fn aggregate_sum(
    table: &Table,
    group_key_field: &str,
    measure_field: &str,
) -> IndexMap<String, f64> {
    let mut report = AggregationReport::default();
    let mut sums: IndexMap<String, f64> = IndexMap::new();

    for record in table.records() {
        let Some(entity) = entity_of(&record, group_key_field) else {
            continue;
        };
        let value = read_measure(&record, measure_field, &mut report);
        match sums.get_mut(entity) {
            Some(acc) => *acc += value,
            None => {
                sums.insert(entity.to_string(), value);
            }
        }
    }

    sums
}

/// Sum every measure per entity in one pass.
///
/// Every entity seen in the table gets a row, with zero for any measure it
/// never contributed to.
pub fn aggregate_measures(
    table: &Table,
    columns: &ColumnMap,
) -> (Vec<AggregateRow>, AggregationReport) {
    let mut report = AggregationReport::default();
    let mut rows: IndexMap<String, AggregateRow> = IndexMap::new();

    for record in table.records() {
        let Some(entity) = entity_of(&record, &columns.entity) else {
            report.skipped_rows += 1;
            continue;
        };

        let applied = read_measure(&record, columns.column(Measure::Applied), &mut report);
        let approved = read_measure(&record, columns.column(Measure::Approved), &mut report);
        let mous = read_measure(&record, columns.column(Measure::MoUs), &mut report);
        let total = read_measure(&record, columns.column(Measure::Total), &mut report);
        let sus = read_measure(&record, columns.column(Measure::SUs), &mut report);

        let row = rows
            .entry(entity.to_string())
            .or_insert_with(|| AggregateRow::new(entity));
        row.applied += applied;
        row.approved += approved;
        row.mous += mous;
        row.total += total;
        row.sus += sus;
    }

    debug!(
        "Aggregated {} rows into {} entities",
        table.len(),
        rows.len()
    );

    (rows.into_values().collect(), report)
}

/// Attach the ratio and score to each aggregate.
pub fn combine(rows: &[AggregateRow]) -> Vec<CombinedRow> {
    rows.iter()
        .map(|r| CombinedRow {
            entity: r.entity.clone(),
            applications: r.applied,
            approvals: r.approved,
            units: r.mous,
            sign_ups: r.sus,
            ratio: ratio_value(r.approved, r.applied),
            score: r.total,
        })
        .collect()
}

pub fn summarize(rows: &[CombinedRow]) -> Summary {
    let total_applications: f64 = rows.iter().map(|r| r.applications).sum();
    let total_approvals: f64 = rows.iter().map(|r| r.approvals).sum();
    let total_units: f64 = rows.iter().map(|r| r.units).sum();
    let conversion_rate = if total_applications != 0.0 {
        round2(total_approvals / total_applications)
    } else {
        0.0
    };

    Summary {
        total_applications,
        total_approvals,
        total_units,
        conversion_rate,
    }
}

fn series_title(metric: Metric, mode: Mode) -> String {
    match metric {
        Metric::Applications => format!("🌍 {} Applications by Entity", mode),
        Metric::Approvals => format!("✅ {} Approvals by Entity", mode),
        Metric::Units => format!("📩 {} MoUs by Entity", mode),
        Metric::SignUps => format!("📩 {} Sign Ups by Entity", mode),
        Metric::Ratio => format!("📊 {} Applied to Approved Ratio by Entity", mode),
        Metric::Score => format!("🔥 {} Score by Entity", mode),
    }
}

/// Chart data for one metric, in entity first-seen order.
pub fn series(rows: &[CombinedRow], metric: Metric, mode: Mode) -> Series {
    Series {
        metric,
        title: series_title(metric, mode),
        label: metric.label().to_string(),
        points: rows
            .iter()
            .map(|r| SeriesPoint {
                entity: r.entity.clone(),
                value: metric.value_of(r),
            })
            .collect(),
    }
}
