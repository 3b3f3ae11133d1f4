//! Cumulative leaderboard models.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One player's accumulated standing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// Player (canonical username)
    pub player: String,

    pub first_places: u32,
    pub second_places: u32,
    pub third_places: u32,

    /// Number of tournament appearances
    pub participations: u32,

    /// Sum of the player's scores
    pub total_score: u64,
}

impl LeaderboardRow {
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            ..Default::default()
        }
    }

    /// Record a podium finish for a 0-indexed rank. Ranks past third are ignored.
    pub fn add_placement(&mut self, rank: usize) {
        match rank {
            0 => self.first_places += 1,
            1 => self.second_places += 1,
            2 => self.third_places += 1,
            _ => {}
        }
    }

    /// Total podium finishes.
    pub fn podiums(&self) -> u32 {
        self.first_places + self.second_places + self.third_places
    }
}

/// Leaderboard ordering: total score descending, then player name ascending.
pub fn standing_order(a: &LeaderboardRow, b: &LeaderboardRow) -> Ordering {
    b.total_score
        .cmp(&a.total_score)
        .then_with(|| a.player.cmp(&b.player))
}

/// An ordered leaderboard table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    rows: Vec<LeaderboardRow>,
}

impl Leaderboard {
    /// Build a leaderboard, sorting rows into standing order.
    pub fn from_rows(mut rows: Vec<LeaderboardRow>) -> Self {
        rows.sort_by(standing_order);
        Self { rows }
    }

    /// Wrap rows that are already in their final order.
    pub(crate) fn from_sorted(rows: Vec<LeaderboardRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[LeaderboardRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a player's row.
    pub fn get(&self, player: &str) -> Option<&LeaderboardRow> {
        self.rows.iter().find(|r| r.player == player)
    }

    /// The best `n` rows.
    pub fn top(&self, n: usize) -> &[LeaderboardRow] {
        &self.rows[..n.min(self.rows.len())]
    }
}

/// Time window a leaderboard covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    AllTime,
    Year(i32),
}

impl Scope {
    /// Table name used for persistence.
    pub fn table_name(&self) -> String {
        match self {
            Scope::AllTime => "score_table_all".to_string(),
            Scope::Year(year) => format!("score_table_{}", year),
        }
    }

    /// Parse a table name back into a scope.
    pub fn from_table_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix("score_table_")?;
        if rest == "all" {
            Some(Scope::AllTime)
        } else {
            rest.parse().ok().map(Scope::Year)
        }
    }

    /// Year filter to aggregate with.
    pub fn year(&self) -> Option<i32> {
        match self {
            Scope::AllTime => None,
            Scope::Year(year) => Some(*year),
        }
    }
}

impl From<Option<i32>> for Scope {
    fn from(year: Option<i32>) -> Self {
        year.map_or(Scope::AllTime, Scope::Year)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::AllTime => write!(f, "all-time"),
            Scope::Year(year) => write!(f, "{}", year),
        }
    }
}
