//! Per-function breakdown of the sheet.

use indexmap::{IndexMap, IndexSet};

use super::ratio_value;
use crate::models::{ColumnMap, FunctionRow, Measure, Table};

/// Distinct function names in first-seen order.
pub fn functions(table: &Table, columns: &ColumnMap) -> Vec<String> {
    let names: IndexSet<&str> = table
        .records()
        .filter_map(|r| r.text(&columns.function))
        .collect();
    names.into_iter().map(str::to_string).collect()
}

/// Sums per entity over the rows of one function.
///
/// Only entities with at least one row for the function are listed.
pub fn functional_breakdown(table: &Table, columns: &ColumnMap, function: &str) -> Vec<FunctionRow> {
    let mut sums: IndexMap<&str, (f64, f64, f64)> = IndexMap::new();

    for record in table.records() {
        if record.text(&columns.function) != Some(function) {
            continue;
        }
        let Some(entity) = record.text(&columns.entity) else {
            continue;
        };

        let entry = sums.entry(entity).or_insert((0.0, 0.0, 0.0));
        entry.0 += record.numeric(columns.column(Measure::SUs)).value();
        entry.1 += record.numeric(columns.column(Measure::Applied)).value();
        entry.2 += record.numeric(columns.column(Measure::Approved)).value();
    }

    sums.into_iter()
        .map(|(entity, (sign_ups, applications, approvals))| FunctionRow {
            entity: entity.to_string(),
            sign_ups,
            applications,
            approvals,
            ratio: ratio_value(approvals, applications),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mode;

    fn sheet() -> Table {
        Table::new(
            vec![
                "Entity".into(),
                "Function".into(),
                "Total SUs".into(),
                "Total Applied".into(),
                "Total Approved".into(),
            ],
            vec![
                vec!["CC".into(), "oGV".into(), "4".into(), "2".into(), "1".into()],
                vec!["CN".into(), "iGTa".into(), "0".into(), "3".into(), "3".into()],
                vec!["CC".into(), "oGV".into(), "1".into(), "2".into(), "0".into()],
                vec!["CS".into(), "oGV".into(), "0".into(), "0".into(), "0".into()],
                vec!["CN".into(), "".into(), "9".into(), "9".into(), "9".into()],
            ],
        )
    }

    #[test]
    fn test_functions_first_seen_order() {
        let names = functions(&sheet(), &ColumnMap::for_mode(Mode::Total));
        assert_eq!(names, vec!["oGV".to_string(), "iGTa".to_string()]);
    }

    #[test]
    fn test_functional_breakdown() {
        let rows = functional_breakdown(&sheet(), &ColumnMap::for_mode(Mode::Total), "oGV");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity, "CC");
        assert_eq!(rows[0].sign_ups, 5.0);
        assert_eq!(rows[0].applications, 4.0);
        assert_eq!(rows[0].approvals, 1.0);
        assert_eq!(rows[0].ratio, 25.0);
        assert_eq!(rows[1].entity, "CS");
        assert_eq!(rows[1].ratio, 0.0);
    }

    #[test]
    fn test_functional_breakdown_unknown_function() {
        let rows = functional_breakdown(&sheet(), &ColumnMap::default(), "oGTe");
        assert!(rows.is_empty());
    }
}
