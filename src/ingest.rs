//! Tournament ingestion: listing, result caching and per-tournament extraction.

use std::path::PathBuf;

use chrono::DateTime;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ClubConfig;
use crate::fetch::{ArenaClock, ArenaResultEntry, ArenaSummary, FetchError, TournamentApi};
use crate::models::{PlayerResult, TournamentRecord};
use crate::storage::{CacheKey, ResultCache, StorageError};

/// Characters of league/qualifier suffix trimmed from arena titles.
pub const NAME_SUFFIX_LEN: usize = 12;

/// Errors that can occur during ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No cached results for tournament {id} (expected {path})")]
    CacheMiss { id: String, path: PathBuf },

    #[error("Malformed cached results for tournament {id}: {source}")]
    MalformedCache {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Start timestamp {0} ms is out of range")]
    InvalidTimestamp(i64),
}

/// Outcome of warming the result cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmReport {
    /// Result sets downloaded in this run
    pub fetched: usize,

    /// Result sets already present
    pub cached: usize,
}

/// `s` without its last `n` characters.
fn strip_trailing_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return "";
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Clock as "<minutes> + <increment>", minutes truncated.
pub fn format_time_control(clock: &ArenaClock) -> String {
    format!("{} + {}", clock.limit / 60, clock.increment)
}

/// Turn one listing entry into a tournament record.
pub fn to_record(arena: &ArenaSummary) -> Result<TournamentRecord, IngestError> {
    let starts_at = DateTime::from_timestamp_millis(arena.starts_at)
        .ok_or(IngestError::InvalidTimestamp(arena.starts_at))?;

    Ok(TournamentRecord::new(
        starts_at.date_naive(),
        strip_trailing_chars(&arena.full_name, NAME_SUFFIX_LEN).to_string(),
        format_time_control(&arena.clock),
        arena.id.clone(),
    ))
}

/// Keep the arenas created by `organizer`, in listing order.
pub fn select_organizer_tournaments(
    arenas: &[ArenaSummary],
    organizer: &str,
) -> Result<Vec<TournamentRecord>, IngestError> {
    arenas
        .iter()
        .filter(|a| a.created_by == organizer)
        .map(to_record)
        .collect()
}

/// List the organizer's tournaments for a club, most recent first.
pub async fn list_tournaments(
    api: &dyn TournamentApi,
    club: &ClubConfig,
) -> Result<Vec<TournamentRecord>, IngestError> {
    let arenas = api.team_arenas(&club.club, club.max_tournaments).await?;
    let records = select_organizer_tournaments(&arenas, &club.organizer)?;

    info!(
        "{} of {} arenas were created by {}",
        records.len(),
        arenas.len(),
        club.organizer
    );
    Ok(records)
}

/// Make sure every tournament's full result list is cached.
///
/// Cached tournaments are never requested again. The first failed request
/// aborts the run; entries written before it stay cached.
pub async fn warm_cache(
    api: &dyn TournamentApi,
    cache: &ResultCache,
    records: &[TournamentRecord],
    club: &str,
) -> Result<WarmReport, IngestError> {
    let mut report = WarmReport::default();

    for record in records {
        let key = CacheKey::for_record(club, record);
        let id = record.id.as_str();

        let lookup = cache
            .get_or_fetch(&key, move || async move {
                let entries = api.arena_results(id).await?;
                let payload = serde_json::to_vec(&entries).map_err(StorageError::Json)?;
                Ok::<_, IngestError>(payload)
            })
            .await?;

        if lookup.was_cached() {
            report.cached += 1;
        } else {
            info!("Cached results of {} ({})", record.name, record.url());
            report.fetched += 1;
        }
    }

    info!(
        "Result cache warm: {} fetched, {} already cached",
        report.fetched, report.cached
    );
    Ok(report)
}

/// Club members of a raw result list, ranked by their order in it.
pub fn club_results(entries: Vec<ArenaResultEntry>, club: &str) -> Vec<PlayerResult> {
    entries
        .into_iter()
        .filter(|e| e.team == club)
        .enumerate()
        .map(|(rank, e)| PlayerResult::new(rank, e.username, e.score))
        .collect()
}

/// Attach each tournament's club results from the cache.
pub async fn extract_results(
    cache: &ResultCache,
    records: &mut [TournamentRecord],
    club: &str,
) -> Result<(), IngestError> {
    for record in records.iter_mut() {
        let key = CacheKey::for_record(club, record);
        let payload = cache
            .get(&key)
            .await?
            .ok_or_else(|| IngestError::CacheMiss {
                id: record.id.clone(),
                path: cache.path_for(&key),
            })?;

        let entries: Vec<ArenaResultEntry> =
            serde_json::from_slice(&payload).map_err(|source| IngestError::MalformedCache {
                id: record.id.clone(),
                source,
            })?;

        record.results = club_results(entries, club);
        debug!(
            "{} {}: {} club players",
            record.date,
            record.name,
            record.participant_count()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockApi;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    const CLUB: &str = "sc-weisse-dame-ev";

    fn arena(id: &str, created_by: &str, starts_at: i64, full_name: &str) -> ArenaSummary {
        ArenaSummary {
            id: id.to_string(),
            created_by: created_by.to_string(),
            starts_at,
            full_name: full_name.to_string(),
            clock: ArenaClock {
                limit: 180,
                increment: 2,
            },
        }
    }

    fn entry(username: &str, team: &str, score: u32) -> Value {
        json!({ "rank": 1, "username": username, "team": team, "score": score, "rating": 1800 })
    }

    fn club_config() -> ClubConfig {
        ClubConfig::default()
    }

    #[test]
    fn test_strip_trailing_chars() {
        assert_eq!(strip_trailing_chars("Q-Liga 5. Liga Team Battle", 12), "Q-Liga 5. Liga");
        assert_eq!(strip_trailing_chars("short", 12), "");
        assert_eq!(strip_trailing_chars("exactly12chr", 12), "");
        assert_eq!(strip_trailing_chars("Großmeister-Arena", 5), "Großmeister-");
    }

    #[test]
    fn test_format_time_control() {
        assert_eq!(format_time_control(&ArenaClock { limit: 180, increment: 2 }), "3 + 2");
        assert_eq!(format_time_control(&ArenaClock { limit: 90, increment: 0 }), "1 + 0");
        assert_eq!(format_time_control(&ArenaClock { limit: 30, increment: 0 }), "0 + 0");
    }

    #[test]
    fn test_to_record_uses_utc_date() {
        // 2021-03-14T23:30:00Z
        let record = to_record(&arena("aBcD1234", "jeffforever", 1_615_764_600_000, "WeDa Q-Liga 5. Liga Arena")).unwrap();

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2021, 3, 14).unwrap());
        assert_eq!(record.name, "WeDa Q-Liga 5");
        assert_eq!(record.time_control, "3 + 2");
        assert_eq!(record.id, "aBcD1234");
        assert!(record.results.is_empty());
    }

    #[test]
    fn test_to_record_rejects_bad_timestamp() {
        let err = to_record(&arena("x", "jeffforever", i64::MAX, "Arena")).unwrap_err();
        assert!(matches!(err, IngestError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_select_keeps_only_organizer_in_order() {
        let arenas = vec![
            arena("id000003", "jeffforever", 1_640_995_200_000, "Third arena Team Battle"),
            arena("id000x", "someone-else", 1_640_995_200_000, "Other arena"),
            arena("id000002", "jeffforever", 1_609_459_200_000, "Second arena Team Battle"),
            arena("id000001", "JeffForever", 1_577_836_800_000, "Case differs"),
        ];

        let records = select_organizer_tournaments(&arenas, "jeffforever").unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, vec!["id000003", "id000002"]);
        assert_eq!(records[0].name, "Third arena");
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
    }

    #[tokio::test]
    async fn test_list_tournaments_respects_max() {
        let api = MockApi::new(vec![
            arena("a1", "jeffforever", 1_640_995_200_000, "A"),
            arena("a2", "jeffforever", 1_640_995_200_000, "B"),
        ]);
        let mut club = club_config();
        club.max_tournaments = 1;

        let records = list_tournaments(&api, &club).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_club_results_filters_and_ranks() {
        let entries: Vec<ArenaResultEntry> = serde_json::from_value(json!([
            { "username": "outsider", "team": "other-club", "score": 50 },
            { "username": "alice", "team": CLUB, "score": 40 },
            { "username": "lonewolf", "team": "", "score": 35 },
            { "username": "bob", "team": CLUB, "score": 22 },
        ]))
        .unwrap();

        assert_eq!(
            club_results(entries, CLUB),
            vec![
                PlayerResult::new(0, "alice", 40),
                PlayerResult::new(1, "bob", 22),
            ]
        );
    }

    #[tokio::test]
    async fn test_warm_cache_fetches_each_tournament_once() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResultCache::new(temp_dir.path().to_path_buf());
        let api = MockApi::new(vec![
            arena("tourney01", "jeffforever", 1_640_995_200_000, "First"),
            arena("tourney02", "jeffforever", 1_641_081_600_000, "Second"),
        ])
        .with_results("tourney01", vec![entry("alice", CLUB, 10)])
        .with_results("tourney02", vec![entry("bob", CLUB, 8)]);

        let records = list_tournaments(&api, &club_config()).await.unwrap();

        let first = warm_cache(&api, &cache, &records, CLUB).await.unwrap();
        let second = warm_cache(&api, &cache, &records, CLUB).await.unwrap();

        assert_eq!(first, WarmReport { fetched: 2, cached: 0 });
        assert_eq!(second, WarmReport { fetched: 0, cached: 2 });
        assert_eq!(api.result_calls(), vec!["tourney01", "tourney02"]);
    }

    #[tokio::test]
    async fn test_warm_cache_stores_verbatim_array() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResultCache::new(temp_dir.path().to_path_buf());
        let lines = vec![entry("alice", CLUB, 10), entry("zed", "other", 3)];
        let api = MockApi::new(vec![arena("abcdefgh", "jeffforever", 1_640_995_200_000, "T")])
            .with_results("abcdefgh", lines.clone());

        let records = list_tournaments(&api, &club_config()).await.unwrap();
        warm_cache(&api, &cache, &records, CLUB).await.unwrap();

        let key = CacheKey::for_record(CLUB, &records[0]);
        let stored: Value = serde_json::from_slice(&cache.get(&key).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored, Value::Array(lines));
    }

    #[tokio::test]
    async fn test_warm_cache_fetch_failure_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResultCache::new(temp_dir.path().to_path_buf());
        let api = MockApi::new(vec![
            arena("known001", "jeffforever", 1_640_995_200_000, "Known"),
            arena("missing1", "jeffforever", 1_640_995_200_000, "Missing"),
        ])
        .with_results("known001", vec![entry("alice", CLUB, 10)]);

        let records = list_tournaments(&api, &club_config()).await.unwrap();
        let err = warm_cache(&api, &cache, &records, CLUB).await.unwrap_err();

        assert!(matches!(err, IngestError::Fetch(FetchError::HttpStatus { status: 404, .. })));
        assert!(cache.contains(&CacheKey::for_record(CLUB, &records[0])).await.unwrap());
        assert!(!cache.contains(&CacheKey::for_record(CLUB, &records[1])).await.unwrap());
    }

    #[tokio::test]
    async fn test_extract_results_attaches_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResultCache::new(temp_dir.path().to_path_buf());
        let api = MockApi::new(vec![
            arena("tourney02", "jeffforever", 1_641_081_600_000, "Newer"),
            arena("tourney01", "jeffforever", 1_640_995_200_000, "Older"),
        ])
        .with_results(
            "tourney02",
            vec![entry("x", "other", 60), entry("bob", CLUB, 9), entry("alice", CLUB, 7)],
        )
        .with_results("tourney01", vec![]);

        let mut records = list_tournaments(&api, &club_config()).await.unwrap();
        warm_cache(&api, &cache, &records, CLUB).await.unwrap();
        extract_results(&cache, &mut records, CLUB).await.unwrap();

        assert_eq!(records[0].id, "tourney02");
        assert_eq!(
            records[0].results,
            vec![PlayerResult::new(0, "bob", 9), PlayerResult::new(1, "alice", 7)]
        );
        assert_eq!(records[0].participant_count(), 2);
        assert_eq!(records[1].participant_count(), 0);
    }

    #[tokio::test]
    async fn test_extract_missing_cache_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResultCache::new(temp_dir.path().to_path_buf());
        let mut records = vec![to_record(&arena("nocache1", "jeffforever", 1_640_995_200_000, "T")).unwrap()];

        let err = extract_results(&cache, &mut records, CLUB).await.unwrap_err();
        assert!(matches!(err, IngestError::CacheMiss { .. }));
    }

    #[tokio::test]
    async fn test_extract_corrupt_cache_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResultCache::new(temp_dir.path().to_path_buf());
        let mut records = vec![to_record(&arena("corrupt1", "jeffforever", 1_640_995_200_000, "T")).unwrap()];
        let key = CacheKey::for_record(CLUB, &records[0]);
        cache.put(&key, b"[{\"username\":\"alice\"}]").await.unwrap();

        let err = extract_results(&cache, &mut records, CLUB).await.unwrap_err();
        assert!(matches!(err, IngestError::MalformedCache { .. }));
    }

    #[tokio::test]
    async fn test_extract_entry_without_team_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResultCache::new(temp_dir.path().to_path_buf());
        let mut records = vec![to_record(&arena("noteam01", "jeffforever", 1_640_995_200_000, "T")).unwrap()];
        let key = CacheKey::for_record(CLUB, &records[0]);
        let payload = json!([
            { "username": "alice", "score": 30 },
            { "username": "bob", "team": CLUB, "score": 10 },
        ]);
        cache.put(&key, payload.to_string().as_bytes()).await.unwrap();

        let err = extract_results(&cache, &mut records, CLUB).await.unwrap_err();
        assert!(matches!(err, IngestError::MalformedCache { ref id, .. } if id == "noteam01"));
        assert!(records[0].results.is_empty());
    }
}
