//! Ranking of combined rows.

use std::cmp::Ordering;

use indexmap::IndexMap;
use tracing::warn;

use super::ratio_value;
use crate::models::{CombinedRow, Measure, Medal, Rank, RankedRow};

/// Sort by score and assign ranks and medals.
///
/// The sort is stable, so equal scores keep their input order. Rank is the
/// 1-based output position, except that a score of exactly zero is
/// [`Rank::Unranked`]; remaining positions are not renumbered.
pub fn rank_rows(mut rows: Vec<CombinedRow>) -> Vec<RankedRow> {
    rows.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let position = idx + 1;
            let (rank, medal) = if row.score == 0.0 {
                (Rank::Unranked, None)
            } else {
                (Rank::Position(position as u32), Medal::for_position(position))
            };
            RankedRow::new(rank, medal, row)
        })
        .collect()
}

/// Inner-join per-measure sums with the score sums, then rank.
///
/// Join order follows the first mapping. Entities missing from any input are
/// dropped and logged.
pub fn rank_and_merge(
    per_measure: &[(Measure, IndexMap<String, f64>)],
    totals: &IndexMap<String, f64>,
) -> Vec<RankedRow> {
    let driver = per_measure.first().map(|(_, m)| m).unwrap_or(totals);

    let mut dropped: Vec<&str> = Vec::new();
    let mut combined = Vec::with_capacity(driver.len());

    for entity in driver.keys() {
        let Some(score) = totals.get(entity) else {
            dropped.push(entity);
            continue;
        };
        if per_measure.iter().any(|(_, m)| !m.contains_key(entity)) {
            dropped.push(entity);
            continue;
        }

        let value = |measure: Measure| {
            per_measure
                .iter()
                .find(|(m, _)| *m == measure)
                .and_then(|(_, sums)| sums.get(entity).copied())
                .unwrap_or(0.0)
        };
        let applications = value(Measure::Applied);
        let approvals = value(Measure::Approved);

        combined.push(CombinedRow {
            entity: entity.clone(),
            applications,
            approvals,
            units: value(Measure::MoUs),
            sign_ups: value(Measure::SUs),
            ratio: ratio_value(approvals, applications),
            score: *score,
        });
    }

    // Keys that only exist outside the driving mapping are lost as well.
    for (_, sums) in per_measure.iter().skip(1) {
        for entity in sums.keys() {
            if !driver.contains_key(entity) && !dropped.contains(&entity.as_str()) {
                dropped.push(entity);
            }
        }
    }
    for entity in totals.keys() {
        if !driver.contains_key(entity) && !dropped.contains(&entity.as_str()) {
            dropped.push(entity);
        }
    }

    if !dropped.is_empty() {
        warn!(
            "Dropped {} entit{} missing from at least one aggregate: {}",
            dropped.len(),
            if dropped.len() == 1 { "y" } else { "ies" },
            dropped.join(", ")
        );
    }

    rank_rows(combined)
}
