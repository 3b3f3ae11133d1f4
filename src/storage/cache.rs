//! Raw tournament result cache.
//!
//! A key-path store: each `(club, date, identifier suffix)` key maps to one
//! file holding the payload exactly as fetched. Entries are written once and
//! never refreshed.

use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::NaiveDate;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{StorageConfig, StorageError};
use crate::models::TournamentRecord;

/// Address of one cached result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub club: String,
    pub date: NaiveDate,
    pub id_suffix: String,
}

impl CacheKey {
    pub fn new(club: impl Into<String>, date: NaiveDate, id_suffix: impl Into<String>) -> Self {
        Self {
            club: club.into(),
            date,
            id_suffix: id_suffix.into(),
        }
    }

    /// Key for a tournament's results within a club.
    pub fn for_record(club: &str, record: &TournamentRecord) -> Self {
        Self::new(club, record.date, record.id_suffix())
    }

    /// File name within the club directory.
    pub fn file_name(&self) -> String {
        format!(
            "date_{}_T_id_{}.json",
            self.date.format("%Y-%m-%d"),
            self.id_suffix
        )
    }
}

/// Outcome of [`ResultCache::get_or_fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Payload was already stored.
    Hit(Vec<u8>),
    /// Payload was fetched and stored by this call.
    Fetched(Vec<u8>),
}

impl CacheLookup {
    pub fn was_cached(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

/// File-backed result cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct ResultCache {
    root: PathBuf,
}

impl ResultCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Cache rooted at the data directory's cache folder.
    pub fn from_storage(config: &StorageConfig) -> Self {
        Self::new(config.cache_dir())
    }

    /// Where the payload for `key` lives.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(&key.club).join(key.file_name())
    }

    pub async fn contains(&self, key: &CacheKey) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.path_for(key)).await?)
    }

    /// Stored payload, or `None` when the key has never been written.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store a payload under `key`, replacing any previous content.
    pub async fn put(&self, key: &CacheKey, payload: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path_for(key);

        // create_dir_all treats an existing directory as success
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(payload).await?;
        file.flush().await?;
        drop(file);
        fs::rename(&tmp_path, &path).await?;

        debug!("Cached {} bytes at {}", payload.len(), path.display());
        Ok(path)
    }

    /// Return the stored payload, fetching and storing it first if absent.
    ///
    /// `fetch` runs at most once and only on a miss.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &CacheKey, fetch: F) -> Result<CacheLookup, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, E>>,
        E: From<StorageError>,
    {
        if let Some(bytes) = self.get(key).await? {
            debug!("Cache hit for {}", key.file_name());
            return Ok(CacheLookup::Hit(bytes));
        }

        let payload = fetch().await?;
        self.put(key, &payload).await?;
        Ok(CacheLookup::Fetched(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn key() -> CacheKey {
        CacheKey::new(
            "sc-weisse-dame-ev",
            NaiveDate::from_ymd_opt(2021, 3, 14).unwrap(),
            "aBcD1234",
        )
    }

    #[test]
    fn test_path_layout() {
        let cache = ResultCache::new(PathBuf::from("/data/cache"));

        assert_eq!(
            cache.path_for(&key()),
            PathBuf::from("/data/cache/sc-weisse-dame-ev/date_2021-03-14_T_id_aBcD1234.json")
        );
    }

    #[test]
    fn test_key_for_record_uses_suffix() {
        let record = TournamentRecord::new(
            NaiveDate::from_ymd_opt(2021, 3, 14).unwrap(),
            "Liga".to_string(),
            "3 + 2".to_string(),
            "xxaBcD1234".to_string(),
        );

        assert_eq!(CacheKey::for_record("sc-weisse-dame-ev", &record), key());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResultCache::new(temp_dir.path().to_path_buf());

        assert_eq!(cache.get(&key()).await.unwrap(), None);
        assert!(!cache.contains(&key()).await.unwrap());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResultCache::new(temp_dir.path().to_path_buf());

        cache.put(&key(), b"[1,2,3]").await.unwrap();
        // second put into the existing directory must not fail
        cache.put(&key(), b"[4]").await.unwrap();

        assert!(cache.contains(&key()).await.unwrap());
        assert_eq!(cache.get(&key()).await.unwrap(), Some(b"[4]".to_vec()));
    }

    #[tokio::test]
    async fn test_get_or_fetch_fetches_once() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResultCache::new(temp_dir.path().to_path_buf());
        let counter = Cell::new(0);
        let calls = &counter;

        let first = cache
            .get_or_fetch(&key(), move || async move {
                calls.set(calls.get() + 1);
                Ok::<_, StorageError>(b"[]".to_vec())
            })
            .await
            .unwrap();
        let second = cache
            .get_or_fetch(&key(), move || async move {
                calls.set(calls.get() + 1);
                Ok::<_, StorageError>(b"[\"other\"]".to_vec())
            })
            .await
            .unwrap();

        assert_eq!(counter.get(), 1);
        assert!(!first.was_cached());
        assert!(second.was_cached());
        assert_eq!(second, CacheLookup::Hit(b"[]".to_vec()));
    }

    #[tokio::test]
    async fn test_failed_fetch_stores_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResultCache::new(temp_dir.path().to_path_buf());

        let result = cache
            .get_or_fetch(&key(), || async {
                Err::<Vec<u8>, _>(StorageError::PathNotFound(PathBuf::from("remote")))
            })
            .await;

        assert!(result.is_err());
        assert!(!cache.contains(&key()).await.unwrap());
    }
}
