//! Arena tournament model.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Base URL for tournament pages on Lichess.
pub const TOURNAMENT_URL_BASE: &str = "https://lichess.org/tournament/";

/// Number of trailing identifier characters used in cache keys.
pub const ID_SUFFIX_LEN: usize = 8;

/// A club member's finish in one tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    /// Position among the club's players, 0 = best
    pub rank: usize,

    /// Lichess username
    pub username: String,

    /// Arena score
    pub score: u32,
}

impl PlayerResult {
    pub fn new(rank: usize, username: impl Into<String>, score: u32) -> Self {
        Self {
            rank,
            username: username.into(),
            score,
        }
    }
}

/// One organizer-created arena tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentRecord {
    /// Start date (UTC)
    pub date: NaiveDate,

    /// Display name with the league/qualifier suffix removed
    pub name: String,

    /// Clock as "<minutes> + <increment>"
    pub time_control: String,

    /// Remote tournament identifier
    pub id: String,

    /// Club results, attached once by extraction
    #[serde(default)]
    pub results: Vec<PlayerResult>,
}

impl TournamentRecord {
    /// Create a record without results.
    pub fn new(date: NaiveDate, name: String, time_control: String, id: String) -> Self {
        Self {
            date,
            name,
            time_control,
            id,
            results: Vec::new(),
        }
    }

    /// Builder method to attach results.
    pub fn with_results(mut self, results: Vec<PlayerResult>) -> Self {
        self.results = results;
        self
    }

    /// Number of club members that took part.
    pub fn participant_count(&self) -> usize {
        self.results.len()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Link to the tournament page.
    pub fn url(&self) -> String {
        format!("{}{}", TOURNAMENT_URL_BASE, self.id)
    }

    /// Last characters of the identifier, as used in cache file names.
    pub fn id_suffix(&self) -> &str {
        tail_chars(&self.id, ID_SUFFIX_LEN)
    }
}

/// Last `n` characters of `s` (all of it when shorter).
pub(crate) fn tail_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let start = s
        .char_indices()
        .nth(count - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> TournamentRecord {
        TournamentRecord::new(
            NaiveDate::from_ymd_opt(2021, 3, 14).unwrap(),
            "Quarantäne-Liga 5. Liga".to_string(),
            "3 + 2".to_string(),
            id.to_string(),
        )
    }

    #[test]
    fn test_participant_count_follows_results() {
        let rec = record("aBcD1234");
        assert_eq!(rec.participant_count(), 0);

        let rec = rec.with_results(vec![
            PlayerResult::new(0, "alice", 30),
            PlayerResult::new(1, "bob", 21),
        ]);
        assert_eq!(rec.participant_count(), 2);
    }

    #[test]
    fn test_url_and_suffix() {
        let rec = record("xyzaBcD1234");
        assert_eq!(rec.url(), "https://lichess.org/tournament/xyzaBcD1234");
        assert_eq!(rec.id_suffix(), "aBcD1234");
        assert_eq!(rec.year(), 2021);
    }

    #[test]
    fn test_suffix_of_short_id() {
        assert_eq!(record("abc").id_suffix(), "abc");
    }

    #[test]
    fn test_tail_chars_multibyte() {
        assert_eq!(tail_chars("Schachäöü", 3), "äöü");
        assert_eq!(tail_chars("", 3), "");
    }

    #[test]
    fn test_record_serialization_defaults_results() {
        let json = r#"{"date":"2021-03-14","name":"Liga","time_control":"3 + 2","id":"aBcD1234"}"#;
        let rec: TournamentRecord = serde_json::from_str(json).unwrap();
        assert!(rec.results.is_empty());
    }
}
