//! File-backed Cache Repository
//!
//! One JSON document per record at `<root>/<namespace>/<fingerprint>.json`.
//! Writes go to a uniquely named temp file in the same directory which is
//! flushed to disk and then renamed over the record, so readers never see
//! a torn write and a crash leaves either the old or the new record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use privy::{CacheError, CacheKey, CacheRecord, CacheRepository};

const EXTENSION: &str = "json";

pub struct FileCacheRepository {
    root: PathBuf,
}

impl FileCacheRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(&key.namespace)
    }

    fn record_path(&self, key: &CacheKey) -> PathBuf {
        self.namespace_dir(key)
            .join(format!("{}.{}", key.fingerprint, EXTENSION))
    }
}

/// Write `body` and wait until it has reached the disk
async fn write_synced(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(body).await?;
    file.sync_all().await
}

async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir).await?.sync_all().await
}

#[async_trait]
impl CacheRepository for FileCacheRepository {
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheRecord>, CacheError> {
        let bytes = match fs::read(self.record_path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| CacheError::Corrupt(format!("{}: {}", key, e)))
    }

    async fn store(&self, key: &CacheKey, record: &CacheRecord) -> Result<(), CacheError> {
        let dir = self.namespace_dir(key);
        fs::create_dir_all(&dir).await?;

        let body = serde_json::to_vec_pretty(record)
            .map_err(|e| CacheError::Corrupt(format!("{}: {}", key, e)))?;
        let temp = dir.join(format!(".{}.{}.tmp", key.fingerprint, Uuid::new_v4()));

        let written = match write_synced(&temp, &body).await {
            Ok(()) => fs::rename(&temp, self.record_path(key)).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        // Persist the rename itself; not every platform can open a directory
        if let Err(e) = sync_dir(&dir).await {
            tracing::debug!("Could not sync cache directory {:?}: {}", dir, e);
        }
        Ok(())
    }

    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(fs::try_exists(self.record_path(key)).await?)
    }

    async fn len(&self) -> Result<usize, CacheError> {
        let mut namespaces = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut count = 0;
        while let Some(namespace) = namespaces.next_entry().await? {
            if !namespace.file_type().await?.is_dir() {
                continue;
            }
            let mut records = fs::read_dir(namespace.path()).await?;
            while let Some(record) = records.next_entry().await? {
                let path = record.path();
                let is_record = path.extension().and_then(|e| e.to_str()) == Some(EXTENSION);
                let hidden = record.file_name().to_string_lossy().starts_with('.');
                if is_record && !hidden {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use privy::CacheStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileCacheRepository::new(dir.path());
        let key = CacheKey::new("search_tool", "Rust news");

        assert!(repo.load(&key).await.unwrap().is_none());
        assert!(!repo.contains(&key).await.unwrap());

        let record = CacheRecord::success("Rust news", "--- SEARCH RESULTS ---");
        repo.store(&key, &record).await.unwrap();

        assert_eq!(repo.load(&key).await.unwrap(), Some(record));
        assert!(repo.contains(&key).await.unwrap());
        assert_eq!(repo.len().await.unwrap(), 1);

        let path = dir
            .path()
            .join("search_tool")
            .join(format!("{}.json", key.fingerprint));
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn test_record_format_is_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileCacheRepository::new(dir.path());
        let key = CacheKey::new("weather_tool", "london");
        repo.store(&key, &CacheRecord::failure("london", "timed out"))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(repo.record_path(&key)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["query"], "london");
        assert_eq!(json["result"], "timed out");
        assert_eq!(json["failed"], true);
        assert!(json["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileCacheRepository::new(dir.path());
        let key = CacheKey::new("search_tool", "q");

        repo.store(&key, &CacheRecord::success("q", "one")).await.unwrap();
        repo.store(&key, &CacheRecord::success("q", "two")).await.unwrap();

        assert_eq!(repo.load(&key).await.unwrap().unwrap().result, "two");
        let files = std::fs::read_dir(dir.path().join("search_tool")).unwrap().count();
        assert_eq!(files, 1);
    }

    #[tokio::test]
    async fn test_interrupted_write_keeps_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileCacheRepository::new(dir.path());
        let key = CacheKey::new("search_tool", "q");
        repo.store(&key, &CacheRecord::success("q", "one")).await.unwrap();

        // A temp file left behind by a write that never reached the rename
        let temp = repo
            .namespace_dir(&key)
            .join(format!(".{}.{}.tmp", key.fingerprint, Uuid::new_v4()));
        std::fs::write(&temp, b"{\"query\": \"q\", \"res").unwrap();

        assert_eq!(repo.load(&key).await.unwrap().unwrap().result, "one");
        assert_eq!(repo.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_synced_write_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let body = vec![b'x'; 64 * 1024];

        write_synced(&path, &body).await.unwrap();
        sync_dir(dir.path()).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), body);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileCacheRepository::new(dir.path());
        let key = CacheKey::new("search_tool", "q");
        std::fs::create_dir_all(repo.namespace_dir(&key)).unwrap();
        std::fs::write(repo.record_path(&key), b"{ not json").unwrap();

        assert!(matches!(repo.load(&key).await, Err(CacheError::Corrupt(_))));

        // The store degrades to a miss rather than failing the caller
        let store = CacheStore::new(Arc::new(repo));
        assert!(store.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_len_of_missing_root_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileCacheRepository::new(dir.path().join("absent"));
        assert_eq!(repo.len().await.unwrap(), 0);
    }
}
