//! Tabular snapshot of the source sheet.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Required columns are missing from a fetched sheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Result of reading a cell as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    /// A finite number was read.
    Value(f64),
    /// The cell was absent or blank; counts as zero.
    Blank,
    /// The cell held something that is not a finite number; counts as zero.
    Malformed,
}

impl Numeric {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Numeric::Blank;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Numeric::Blank;
        }

        let cleaned: String = trimmed
            .trim_end_matches('%')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        match cleaned.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Numeric::Value(v),
            _ => Numeric::Malformed,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Numeric::Value(v) => *v,
            Numeric::Blank | Numeric::Malformed => 0.0,
        }
    }
}

/// Header row plus string cells, as read from CSV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Check that every named column exists, reporting all that don't.
    pub fn require_columns(&self, names: &[&str]) -> Result<(), SchemaError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|n| !self.has_column(n))
            .map(|n| n.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::MissingColumns(missing))
        }
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().enumerate().map(move |(line, cells)| Record {
            table: self,
            cells,
            line,
        })
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    table: &'a Table,
    cells: &'a [String],
    /// Zero-based data row index (header excluded).
    pub line: usize,
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.table.column_index(column)?;
        self.cells.get(idx).map(|s| s.as_str())
    }

    /// Trimmed text of a column, `None` when absent or blank.
    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn numeric(&self, column: &str) -> Numeric {
        Numeric::parse(self.get(column))
    }
}
