//! Lichess API access.
//!
//! Both endpoints used here answer with newline-delimited JSON. Requests are
//! issued one at a time; a failed request is returned to the caller as-is.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::ApiConfig;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Malformed NDJSON at line {line}: {source}")]
    Ndjson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Clock settings of an arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaClock {
    /// Initial time in seconds
    pub limit: u32,

    /// Increment in seconds
    pub increment: u32,
}

/// One entry of the team arena listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaSummary {
    pub id: String,
    pub created_by: String,

    /// Start time in milliseconds since the Unix epoch
    pub starts_at: i64,

    pub full_name: String,
    pub clock: ArenaClock,
}

/// One participant line of an arena's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaResultEntry {
    pub username: String,

    /// Team the player represented
    pub team: String,

    pub score: u32,
}

/// Read access to the remote tournament platform.
#[async_trait]
pub trait TournamentApi: Send + Sync {
    /// Arenas of a team, most recent first.
    async fn team_arenas(&self, club: &str, max: u32) -> Result<Vec<ArenaSummary>, FetchError>;

    /// Full results of one arena, as raw JSON objects in ranking order.
    async fn arena_results(&self, tournament_id: &str) -> Result<Vec<Value>, FetchError>;
}

/// Parse a newline-delimited JSON body. Blank lines are skipped.
pub fn parse_ndjson<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, FetchError> {
    let mut items = Vec::new();

    for (idx, line) in body.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(line).map_err(|source| FetchError::Ndjson {
            line: idx + 1,
            source,
        })?;
        items.push(item);
    }

    Ok(items)
}

/// HTTP client for the Lichess API.
pub struct LichessClient {
    client: Client,
    base_url: Url,
}

impl LichessClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| FetchError::InvalidHeader(format!("user agent: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/x-ndjson"));

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn team_arenas_url(&self, club: &str, max: u32) -> Result<Url, FetchError> {
        let mut url = self.endpoint(&["api", "team", club, "arena"])?;
        url.query_pairs_mut().append_pair("max", &max.to_string());
        Ok(url)
    }

    fn arena_results_url(&self, tournament_id: &str) -> Result<Url, FetchError> {
        self.endpoint(&["api", "tournament", tournament_id, "results"])
    }

    async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TournamentApi for LichessClient {
    async fn team_arenas(&self, club: &str, max: u32) -> Result<Vec<ArenaSummary>, FetchError> {
        let url = self.team_arenas_url(club, max)?;
        info!("Listing arenas of team {}", club);

        let body = self.get_text(&url).await?;
        let arenas: Vec<ArenaSummary> = parse_ndjson(&body)?;

        info!("Team {} lists {} arenas", club, arenas.len());
        Ok(arenas)
    }

    async fn arena_results(&self, tournament_id: &str) -> Result<Vec<Value>, FetchError> {
        let url = self.arena_results_url(tournament_id)?;
        info!("Fetching results of arena {}", tournament_id);

        let body = self.get_text(&url).await?;
        parse_ndjson(&body)
    }
}

/// In-memory API for tests. Counts result requests per tournament.
#[cfg(test)]
#[derive(Default)]
pub struct MockApi {
    arenas: Vec<ArenaSummary>,
    results: std::collections::HashMap<String, Vec<Value>>,
    result_calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockApi {
    pub fn new(arenas: Vec<ArenaSummary>) -> Self {
        Self {
            arenas,
            ..Default::default()
        }
    }

    /// Register the result lines served for a tournament.
    pub fn with_results(mut self, tournament_id: &str, entries: Vec<Value>) -> Self {
        self.results.insert(tournament_id.to_string(), entries);
        self
    }

    /// Tournament ids whose results were requested, in request order.
    pub fn result_calls(&self) -> Vec<String> {
        self.result_calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl TournamentApi for MockApi {
    async fn team_arenas(&self, _club: &str, max: u32) -> Result<Vec<ArenaSummary>, FetchError> {
        Ok(self.arenas.iter().take(max as usize).cloned().collect())
    }

    async fn arena_results(&self, tournament_id: &str) -> Result<Vec<Value>, FetchError> {
        self.result_calls
            .lock()
            .unwrap()
            .push(tournament_id.to_string());
        self.results
            .get(tournament_id)
            .cloned()
            .ok_or_else(|| FetchError::HttpStatus {
                status: 404,
                url: format!("mock://tournament/{}/results", tournament_id),
            })
    }
}
