//! # Ops Leaderboard
//!
//! Polls a published spreadsheet and ranks the entities in it.
//!
//! ## Architecture
//!
//! - **models**: Sheet snapshot, measures, ranked rows
//! - **fetch**: CSV export download with a short-lived cache
//! - **calculate**: Group sums, ratios, ranking and per-function breakdown
//! - **pipeline**: One fetch-to-dashboard cycle
//! - **refresh**: Periodic and manual refresh cycles
//! - **render**: HTML page, SVG charts and text table
//! - **api**: REST API endpoints and the dashboard page
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod refresh;
pub mod render;

pub use models::*;

use std::time::Duration;

/// Parse a refresh interval such as "1m", "90s" or "2h".
///
/// A bare number is read as minutes, the unit the config file uses.
/// Zero and overflowing values are rejected.
pub fn parse_interval(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, unit_secs) = match s.char_indices().last()? {
        (i, 'h') => (&s[..i], 3600),
        (i, 'm') => (&s[..i], 60),
        (i, 's') => (&s[..i], 1),
        _ => (s, 60),
    };

    let secs = digits.trim().parse::<u64>().ok()?.checked_mul(unit_secs)?;
    if secs == 0 {
        return None;
    }
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval_units() {
        assert_eq!(parse_interval("2h"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_interval("1m"), Some(Duration::from_secs(60)));
        assert_eq!(parse_interval("90s"), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_parse_interval_bare_number_is_minutes() {
        assert_eq!(parse_interval("5"), Some(Duration::from_secs(300)));
        assert_eq!(parse_interval(" 3 "), Some(Duration::from_secs(180)));
    }

    #[test]
    fn test_parse_interval_rejects_zero() {
        assert_eq!(parse_interval("0s"), None);
        assert_eq!(parse_interval("0"), None);
    }

    #[test]
    fn test_parse_interval_invalid() {
        assert_eq!(parse_interval(""), None);
        assert_eq!(parse_interval("soon"), None);
        assert_eq!(parse_interval("m"), None);
        assert_eq!(parse_interval("-1m"), None);
    }

    #[test]
    fn test_parse_interval_overflow() {
        assert_eq!(parse_interval("18446744073709551615h"), None);
    }
}
