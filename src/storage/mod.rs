//! Local data directory operations.
//!
//! Layout under the data directory:
//! - `cache/<club>/` raw tournament results, one JSON file per tournament
//! - `leaderboards/` persisted leaderboard tables (JSONL)
//! - `charts/` rendered SVG charts

pub mod cache;
pub mod jsonl;
pub mod leaderboard;

use std::path::PathBuf;
use thiserror::Error;

pub use cache::{CacheKey, ResultCache};
pub use jsonl::{JsonlReader, JsonlWriter};
pub use leaderboard::LeaderboardStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Corrupt line {line} in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn leaderboard_dir(&self) -> PathBuf {
        self.data_dir.join("leaderboards")
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.data_dir.join("charts")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(config.cache_dir(), PathBuf::from("/data/cache"));
        assert_eq!(config.leaderboard_dir(), PathBuf::from("/data/leaderboards"));
        assert_eq!(config.charts_dir(), PathBuf::from("/data/charts"));
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }
}
