//! Measures, modes and the column mapping used to read a sheet.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which family of measure columns to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Mode {
    /// Cumulative numbers since the start of the campaign.
    #[default]
    Total,
    /// Numbers for the current daily window.
    Daily,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Total => "Total",
            Mode::Daily => "Daily",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" => Ok(Mode::Total),
            "daily" => Ok(Mode::Daily),
            other => Err(format!("unknown mode '{}' (expected Total or Daily)", other)),
        }
    }
}

/// A numeric column family summed per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Applied,
    Approved,
    #[serde(rename = "mous")]
    MoUs,
    Total,
    #[serde(rename = "sus")]
    SUs,
    AppliedToApproved,
}

impl Measure {
    pub const ALL: [Measure; 6] = [
        Measure::Applied,
        Measure::Approved,
        Measure::MoUs,
        Measure::Total,
        Measure::SUs,
        Measure::AppliedToApproved,
    ];

    /// Column suffix as it appears in the sheet header.
    pub fn column_suffix(&self) -> &'static str {
        match self {
            Measure::Applied => "Applied",
            Measure::Approved => "Approved",
            Measure::MoUs => "MoUs",
            Measure::Total => "Total",
            Measure::SUs => "SUs",
            Measure::AppliedToApproved => "%APL-APD",
        }
    }

    /// Default header for a mode, e.g. `"Total Applied"`.
    pub fn column_for(&self, mode: Mode) -> String {
        format!("{} {}", mode, self.column_suffix())
    }
}

/// Explicit mapping from measures to sheet headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub mode: Mode,
    pub entity: String,
    pub function: String,
    pub measures: BTreeMap<Measure, String>,
}

impl ColumnMap {
    /// Build the default `"{mode} {Measure}"` mapping.
    pub fn for_mode(mode: Mode) -> Self {
        let measures = Measure::ALL
            .iter()
            .map(|m| (*m, m.column_for(mode)))
            .collect();
        Self {
            mode,
            entity: "Entity".to_string(),
            function: "Function".to_string(),
            measures,
        }
    }

    /// Replace individual measure headers.
    pub fn with_overrides(mut self, overrides: &BTreeMap<Measure, String>) -> Self {
        for (measure, column) in overrides {
            self.measures.insert(*measure, column.clone());
        }
        self
    }

    pub fn column(&self, measure: Measure) -> &str {
        self.measures
            .get(&measure)
            .map(String::as_str)
            .unwrap_or_else(|| measure.column_suffix())
    }

    /// Columns the leaderboard cannot be built without.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut cols = vec![self.entity.as_str()];
        for measure in [Measure::Applied, Measure::Approved, Measure::MoUs, Measure::Total] {
            cols.push(self.column(measure));
        }
        cols
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::for_mode(Mode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names_follow_mode() {
        assert_eq!(Measure::Applied.column_for(Mode::Total), "Total Applied");
        assert_eq!(Measure::SUs.column_for(Mode::Daily), "Daily SUs");
        assert_eq!(
            Measure::AppliedToApproved.column_for(Mode::Total),
            "Total %APL-APD"
        );
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("total".parse::<Mode>(), Ok(Mode::Total));
        assert_eq!(" Daily ".parse::<Mode>(), Ok(Mode::Daily));
        assert!("weekly".parse::<Mode>().is_err());
    }

    #[test]
    fn test_column_map_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert(Measure::MoUs, "Signed MoUs".to_string());

        let map = ColumnMap::for_mode(Mode::Daily).with_overrides(&overrides);

        assert_eq!(map.column(Measure::MoUs), "Signed MoUs");
        assert_eq!(map.column(Measure::Applied), "Daily Applied");
        assert_eq!(
            map.required_columns(),
            vec!["Entity", "Daily Applied", "Daily Approved", "Signed MoUs", "Daily Total"]
        );
    }

    #[test]
    fn test_measure_serde_names() {
        assert_eq!(serde_json::to_string(&Measure::MoUs).unwrap(), "\"mous\"");
        assert_eq!(
            serde_json::to_string(&Measure::AppliedToApproved).unwrap(),
            "\"applied_to_approved\""
        );
    }
}
