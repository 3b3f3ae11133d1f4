//! Persisted leaderboard tables, one JSONL file per scope.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use super::{JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::models::{Leaderboard, LeaderboardRow, Scope};

/// Reads and writes leaderboard tables under a directory.
#[derive(Debug, Clone)]
pub struct LeaderboardStore {
    dir: PathBuf,
}

impl LeaderboardStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn from_storage(config: &StorageConfig) -> Self {
        Self::new(config.leaderboard_dir())
    }

    /// File holding the table for `scope`.
    pub fn path_for(&self, scope: Scope) -> PathBuf {
        self.dir.join(format!("{}.jsonl", scope.table_name()))
    }

    /// Persist a table, replacing whatever was stored for the scope.
    pub fn save(&self, scope: Scope, board: &Leaderboard) -> Result<PathBuf, StorageError> {
        let path = self.path_for(scope);
        JsonlWriter::new(path.clone()).write_all(board.rows())?;
        info!("Saved {} leaderboard ({} players)", scope, board.len());
        Ok(path)
    }

    /// Load a table exactly as saved, row order included.
    pub fn load(&self, scope: Scope) -> Result<Leaderboard, StorageError> {
        let rows: Vec<LeaderboardRow> = JsonlReader::new(self.path_for(scope)).read_all()?;
        Ok(Leaderboard::from_sorted(rows))
    }

    /// Scopes with a persisted table, all-time first then by year.
    pub fn scopes(&self) -> Result<Vec<Scope>, StorageError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut scopes = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            if let Some(scope) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(Scope::from_table_name)
            {
                scopes.push(scope);
            }
        }

        scopes.sort();
        Ok(scopes)
    }
}
