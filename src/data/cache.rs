use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{error::AppResult, models::CsvRow};

use super::run_blocking;

/// What a cached dataset was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    async fn read(path: &Path) -> AppResult<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

struct CachedDataset {
    stamp: FileStamp,
    rows: Arc<Vec<CsvRow>>,
    cached_at: DateTime<Utc>,
}

/// In-process cache of loaded CSV files, keyed by path.
///
/// An entry is served while the file's modification time and length match
/// the ones seen when it was loaded; otherwise the file is read again.
#[derive(Clone, Default)]
pub struct DatasetCache {
    entries: Arc<RwLock<HashMap<PathBuf, CachedDataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rows for `path`, running `load` on the blocking pool when
    /// the file is not cached or has changed since it was cached.
    pub async fn get_or_load<F>(&self, path: &Path, load: F) -> AppResult<Arc<Vec<CsvRow>>>
    where
        F: FnOnce() -> AppResult<Vec<CsvRow>> + Send + 'static,
    {
        let stamp = FileStamp::read(path).await?;

        if let Some(entry) = self.entries.read().await.get(path) {
            if entry.stamp == stamp {
                tracing::debug!(
                    path = %path.display(),
                    cached_at = %entry.cached_at,
                    "Dataset cache hit"
                );
                return Ok(entry.rows.clone());
            }
        }

        tracing::debug!(path = %path.display(), "Dataset cache miss");
        let rows = Arc::new(run_blocking(load).await?);

        self.entries.write().await.insert(
            path.to_path_buf(),
            CachedDataset {
                stamp,
                rows: rows.clone(),
                cached_at: Utc::now(),
            },
        );

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CsvLoader;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn cached_files(cache: &DatasetCache) -> usize {
        cache.entries.read().await.len()
    }

    fn counting_loader(
        path: PathBuf,
        calls: Arc<AtomicUsize>,
    ) -> impl FnOnce() -> AppResult<Vec<CsvRow>> + Send + 'static {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            CsvLoader::default().load(path)
        }
    }

    #[tokio::test]
    async fn test_unchanged_file_is_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("average_merged_movies.csv");
        std::fs::write(&path, "title,genre,imdbId\nHeat,Action,tt0113277\n").unwrap();

        let cache = DatasetCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_load(&path, counting_loader(path.clone(), calls.clone()))
            .await
            .unwrap();
        let second = cache
            .get_or_load(&path, counting_loader(path.clone(), calls.clone()))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cached_files(&cache).await, 1);
    }

    #[tokio::test]
    async fn test_modified_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("average_merged_movies.csv");
        std::fs::write(&path, "title,genre,imdbId\nHeat,Action,tt0113277\n").unwrap();

        let cache = DatasetCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_load(&path, counting_loader(path.clone(), calls.clone()))
            .await
            .unwrap();
        assert_eq!(first.len(), 1);

        std::fs::write(
            &path,
            "title,genre,imdbId\nHeat,Action,tt0113277\nBabe,Drama,tt0112431\n",
        )
        .unwrap();

        let second = cache
            .get_or_load(&path, counting_loader(path.clone(), calls.clone()))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "title\nHeat\n").unwrap();

        let cache = DatasetCache::new();
        let result = cache
            .get_or_load(&path, || Err(AppError::Internal("boom".to_string())))
            .await;

        assert!(result.is_err());
        assert_eq!(cached_files(&cache).await, 0);
    }

    #[tokio::test]
    async fn test_missing_file_errors() {
        let cache = DatasetCache::new();
        let result = cache
            .get_or_load(Path::new("no-such-file.csv"), || Ok(Vec::new()))
            .await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn test_length_change_alone_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.csv");
        std::fs::write(&path, "title\nHeat\n").unwrap();
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

        let cache = DatasetCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_load(&path, counting_loader(path.clone(), calls.clone()))
            .await
            .unwrap();

        std::fs::write(&path, "title\nHeat\nBabe\n").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();

        let rows = cache
            .get_or_load(&path, counting_loader(path.clone(), calls.clone()))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(cached_files(&cache).await, 1);
    }
}
