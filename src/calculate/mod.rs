//! Leaderboard aggregation.
//!
//! Folds per-tournament club results into one row per player:
//! - podium counts from each player's rank within a tournament
//! - participation count
//! - cumulative score

use std::collections::{HashMap, HashSet};

use crate::models::{Leaderboard, LeaderboardRow, PlayerResult, Scope, TournamentRecord};

/// Whether a record falls inside an optional year filter.
fn in_year(record: &TournamentRecord, year: Option<i32>) -> bool {
    year.map_or(true, |y| record.year() == y)
}

/// Records held in a given year, in their original order.
pub fn filter_year(records: &[TournamentRecord], year: i32) -> Vec<TournamentRecord> {
    records
        .iter()
        .filter(|r| in_year(r, Some(year)))
        .cloned()
        .collect()
}

/// Build the leaderboard for `records`, optionally restricted to one year.
///
/// Every appearance of a username counts as a participation. When a username
/// appears more than once in a single tournament, only its best-ranked entry
/// contributes placement and score.
pub fn aggregate(records: &[TournamentRecord], year: Option<i32>) -> Leaderboard {
    let mut rows: HashMap<String, LeaderboardRow> = HashMap::new();

    for record in records.iter().filter(|r| in_year(r, year)) {
        let mut ranked: Vec<&PlayerResult> = record.results.iter().collect();
        ranked.sort_by_key(|r| r.rank);

        let mut seen: HashSet<&str> = HashSet::new();
        for result in ranked {
            let row = rows
                .entry(result.username.clone())
                .or_insert_with(|| LeaderboardRow::new(result.username.as_str()));
            row.participations += 1;

            if !seen.insert(result.username.as_str()) {
                continue;
            }
            row.add_placement(result.rank);
            row.total_score += u64::from(result.score);
        }
    }

    Leaderboard::from_rows(rows.into_values().collect())
}

/// Leaderboard for a scope.
pub fn aggregate_scope(records: &[TournamentRecord], scope: Scope) -> Leaderboard {
    aggregate(records, scope.year())
}
