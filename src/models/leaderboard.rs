//! Aggregated, combined and ranked leaderboard rows.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Per-entity sums for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub entity: String,
    pub applied: f64,
    pub approved: f64,
    pub mous: f64,
    pub total: f64,
    pub sus: f64,
}

impl AggregateRow {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Default::default()
        }
    }
}

/// All per-entity values the leaderboard shows, before ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRow {
    pub entity: String,
    pub applications: f64,
    pub approvals: f64,
    pub units: f64,
    pub sign_ups: f64,
    /// Applied → approved percentage, 0 when undefined.
    pub ratio: f64,
    pub score: f64,
}

/// Leaderboard position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Position(u32),
    /// Score is exactly zero.
    Unranked,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Position(n) => write!(f, "{}", n),
            Rank::Unranked => f.write_str("-"),
        }
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rank::Position(n) => serializer.serialize_u32(*n),
            Rank::Unranked => serializer.serialize_str("-"),
        }
    }
}

/// Podium marker for the top three scoring entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Medal for a 1-based position, if it is on the podium.
    pub fn for_position(position: usize) -> Option<Self> {
        match position {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    pub rank: Rank,
    pub medal: Option<Medal>,
    /// Entity name with the medal prefix, for display only.
    pub label: String,
    #[serde(flatten)]
    pub row: CombinedRow,
}

impl RankedRow {
    pub fn new(rank: Rank, medal: Option<Medal>, row: CombinedRow) -> Self {
        let label = match medal {
            Some(m) => format!("{} {}", m.emoji(), row.entity),
            None => row.entity.clone(),
        };
        Self {
            rank,
            medal,
            label,
            row,
        }
    }

    pub fn entity(&self) -> &str {
        &self.row.entity
    }
}

/// Chartable metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Applications,
    Approvals,
    Units,
    SignUps,
    Ratio,
    Score,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Applications,
        Metric::Approvals,
        Metric::Units,
        Metric::SignUps,
        Metric::Ratio,
        Metric::Score,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Metric::Applications => "applications",
            Metric::Approvals => "approvals",
            Metric::Units => "units",
            Metric::SignUps => "sign_ups",
            Metric::Ratio => "ratio",
            Metric::Score => "score",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Metric::ALL.into_iter().find(|m| m.slug() == slug)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Applications => "Applications",
            Metric::Approvals => "Approvals",
            Metric::Units => "MoUs",
            Metric::SignUps => "Sign Ups",
            Metric::Ratio => "%Applied to Approved",
            Metric::Score => "Score",
        }
    }

    pub fn value_of(&self, row: &CombinedRow) -> f64 {
        match self {
            Metric::Applications => row.applications,
            Metric::Approvals => row.approvals,
            Metric::Units => row.units,
            Metric::SignUps => row.sign_ups,
            Metric::Ratio => row.ratio,
            Metric::Score => row.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub entity: String,
    pub value: f64,
}

/// One bar chart worth of data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub metric: Metric,
    pub title: String,
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

/// Headline numbers shown above the leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_applications: f64,
    pub total_approvals: f64,
    pub total_units: f64,
    /// `approved / applied`, rounded to 2 places, 0 when nothing applied.
    pub conversion_rate: f64,
}

/// Per-entity numbers for one function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionRow {
    pub entity: String,
    pub sign_ups: f64,
    pub applications: f64,
    pub approvals: f64,
    pub ratio: f64,
}
