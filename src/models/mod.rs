//! Core data models for the leaderboard.

mod leaderboard;
mod measure;
mod table;

pub use leaderboard::*;
pub use measure::*;
pub use table::*;
