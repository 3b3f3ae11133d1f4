//! Core data models for club arena tracking.

mod alias;
mod leaderboard;
mod tournament;

pub use alias::*;
pub use leaderboard::*;
pub use tournament::*;
