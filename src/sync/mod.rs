//! Pipeline orchestrator.
//!
//! Runs one full refresh, strictly in sequence:
//! 1. List the organizer's tournaments
//! 2. Cache each tournament's raw results
//! 3. Extract club results and apply name aliases
//! 4. Aggregate and store a leaderboard per scope

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::calculate::aggregate_scope;
use crate::config::{AppConfig, ClubConfig, ConfigError};
use crate::fetch::{FetchError, LichessClient, TournamentApi};
use crate::ingest::{self, IngestError, WarmReport};
use crate::models::{Leaderboard, NameAliasMap, Scope, TournamentRecord};
use crate::storage::{LeaderboardStore, ResultCache, StorageConfig, StorageError};

/// Errors that can occur during a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Tournaments with club results attached, most recent first
    pub records: Vec<TournamentRecord>,

    pub warm: WarmReport,

    /// Usernames rewritten by aliasing
    pub aliased: usize,

    /// Stored leaderboards, all-time first
    pub boards: Vec<(Scope, Leaderboard)>,
}

/// The listing → cache → extract → aggregate → store pipeline.
pub struct Pipeline {
    api: Arc<dyn TournamentApi>,
    cache: ResultCache,
    store: LeaderboardStore,
    club: ClubConfig,
    aliases: NameAliasMap,
}

impl Pipeline {
    pub fn new(
        api: Arc<dyn TournamentApi>,
        storage: &StorageConfig,
        club: ClubConfig,
        aliases: NameAliasMap,
    ) -> Self {
        Self {
            api,
            cache: ResultCache::from_storage(storage),
            store: LeaderboardStore::from_storage(storage),
            club,
            aliases,
        }
    }

    /// Build a pipeline from validated application configuration.
    pub fn from_config(
        api: Arc<dyn TournamentApi>,
        config: &AppConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let storage = StorageConfig::new(config.data_dir.clone());
        Ok(Self::new(
            api,
            &storage,
            config.club.clone(),
            config.alias_map(),
        ))
    }

    /// Pipeline backed by the live Lichess API.
    pub fn lichess(config: &AppConfig) -> Result<Self, PipelineError> {
        let client = LichessClient::new(&config.api)?;
        Self::from_config(Arc::new(client), config)
    }

    pub fn store(&self) -> &LeaderboardStore {
        &self.store
    }

    /// Fetch, cache and extract all tournaments, then apply aliases.
    pub async fn collect(&self) -> Result<(Vec<TournamentRecord>, WarmReport, usize), PipelineError> {
        info!("Step 1: Listing tournaments of {}...", self.club.club);
        let mut records = ingest::list_tournaments(self.api.as_ref(), &self.club).await?;

        info!("Step 2: Caching results...");
        let warm =
            ingest::warm_cache(self.api.as_ref(), &self.cache, &records, &self.club.club).await?;

        info!("Step 3: Extracting club results...");
        ingest::extract_results(&self.cache, &mut records, &self.club.club).await?;

        let aliased = self.aliases.apply(&mut records);
        if aliased > 0 {
            info!("  → Rewrote {} aliased usernames", aliased);
        }

        Ok((records, warm, aliased))
    }

    /// Aggregate and persist a leaderboard for every configured scope.
    pub fn publish(
        &self,
        records: &[TournamentRecord],
    ) -> Result<Vec<(Scope, Leaderboard)>, PipelineError> {
        info!("Step 4: Aggregating leaderboards...");
        let mut boards = Vec::new();

        for scope in self.club.scopes() {
            let board = aggregate_scope(records, scope);
            self.store.save(scope, &board)?;
            boards.push((scope, board));
        }

        Ok(boards)
    }

    /// Run the whole pipeline once.
    pub async fn run(&self) -> Result<PipelineRun, PipelineError> {
        info!("=== Starting refresh ===");

        let (records, warm, aliased) = self.collect().await?;
        let boards = self.publish(&records)?;

        info!(
            "=== Refresh complete: {} tournaments, {} leaderboards ===",
            records.len(),
            boards.len()
        );

        Ok(PipelineRun {
            records,
            warm,
            aliased,
            boards,
        })
    }
}
