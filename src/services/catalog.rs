use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    config::Config,
    data::{run_blocking, CsvLoader, DatasetCache},
    error::AppResult,
    models::{CsvRow, MovieSummary, Recommendations, UserId},
    services::recommendations,
};

/// Source of the precomputed recommendation lists
///
/// The HTTP layer only talks to this trait. The CSV-backed implementation is
/// [`CsvCatalog`]; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Top-rated movies stored for the user
    async fn sorted_movies(&self, user_id: UserId) -> AppResult<Vec<MovieSummary>>;

    /// Movies from the global averages list. The user is not consulted.
    async fn average_movies(&self, user_id: UserId) -> AppResult<Vec<MovieSummary>>;

    /// The user's favorite movies, without genres
    async fn favorite_movies(&self, user_id: UserId) -> AppResult<Vec<MovieSummary>>;

    /// All three lists for the results page
    async fn recommendations(&self, user_id: UserId) -> AppResult<Recommendations> {
        let (user_sorted_movies, user_average_movies, user_favorite_movies) = tokio::try_join!(
            self.sorted_movies(user_id),
            self.average_movies(user_id),
            self.favorite_movies(user_id),
        )?;

        Ok(Recommendations {
            user_sorted_movies,
            user_average_movies,
            user_favorite_movies,
        })
    }

    /// Catalog name for logging
    fn name(&self) -> &'static str;
}

/// Locations of the three recommendation files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFiles {
    pub sorted_movies: PathBuf,
    pub average_movies: PathBuf,
    pub favorites: PathBuf,
}

impl DataFiles {
    /// Default file names resolved against `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            sorted_movies: dir.join("sorted_movies_by_rating.csv"),
            average_movies: dir.join("average_merged_movies.csv"),
            favorites: dir.join("user_favorite_genres_and_movies.csv"),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            sorted_movies: config.data_dir.join(&config.sorted_movies_file),
            average_movies: config.data_dir.join(&config.average_movies_file),
            favorites: config.data_dir.join(&config.favorites_file),
        }
    }
}

/// Catalog backed by the precomputed CSV files
#[derive(Clone)]
pub struct CsvCatalog {
    files: DataFiles,
    loader: CsvLoader,
    cache: Option<DatasetCache>,
    result_limit: usize,
}

impl CsvCatalog {
    /// Creates a catalog that rereads the files on every call
    pub fn new(files: DataFiles, loader: CsvLoader, result_limit: usize) -> Self {
        Self {
            files,
            loader,
            cache: None,
            result_limit,
        }
    }

    /// Serves rows from `cache` while the files are unchanged
    pub fn with_cache(mut self, cache: DatasetCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let catalog = Self::new(
            DataFiles::from_config(config),
            CsvLoader::new(config.field_size_limit()),
            config.result_limit,
        );
        if config.cache_datasets {
            catalog.with_cache(DatasetCache::new())
        } else {
            catalog
        }
    }

    pub fn files(&self) -> &DataFiles {
        &self.files
    }

    async fn rows(&self, path: &Path) -> AppResult<Arc<Vec<CsvRow>>> {
        let loader = self.loader.clone();
        let owned = path.to_path_buf();
        let load = move || loader.load(owned);

        match &self.cache {
            Some(cache) => cache.get_or_load(path, load).await,
            None => Ok(Arc::new(run_blocking(load).await?)),
        }
    }
}

#[async_trait::async_trait]
impl MovieCatalog for CsvCatalog {
    async fn sorted_movies(&self, user_id: UserId) -> AppResult<Vec<MovieSummary>> {
        let rows = self.rows(&self.files.sorted_movies).await?;
        let movies = recommendations::user_sorted_movies(&rows, user_id, self.result_limit)?;
        tracing::debug!(user_id, count = movies.len(), "Resolved sorted movies");
        Ok(movies)
    }

    async fn average_movies(&self, _user_id: UserId) -> AppResult<Vec<MovieSummary>> {
        let rows = self.rows(&self.files.average_movies).await?;
        recommendations::average_movies(&rows, self.result_limit)
    }

    async fn favorite_movies(&self, user_id: UserId) -> AppResult<Vec<MovieSummary>> {
        let rows = self.rows(&self.files.favorites).await?;
        let movies = recommendations::user_favorite_movies(&rows, user_id)?;
        tracing::debug!(user_id, count = movies.len(), "Resolved favorite movies");
        Ok(movies)
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use tokio_test::{assert_err, assert_ok};

    const RATINGS: &str = "userId,movies\n\
        1,\"[{'title': 'Toy Story (1995)', 'genre': 'Animation', 'imdbId': 'tt0114709'}]\"\n\
        7,\"[{'title':'Inception','genre':'Sci-Fi','imdbId':'tt1375666'}]\"\n";
    const AVERAGES: &str = "title,genre,imdbId\n\
        Heat (1995),Action|Crime,tt0113277\n\
        Babe (1995),Children|Drama,tt0112431\n";
    const FAVORITES: &str = "userId,Genres,Movies\n\
        7,\"['Sci-Fi']\",\"[[{'title': 'Inception', 'imdbId': 'tt1375666'}]]\"\n";

    fn write_fixtures(dir: &Path) {
        let files = DataFiles::in_dir(dir);
        std::fs::write(&files.sorted_movies, RATINGS).unwrap();
        std::fs::write(&files.average_movies, AVERAGES).unwrap();
        std::fs::write(&files.favorites, FAVORITES).unwrap();
    }

    fn catalog(dir: &Path) -> CsvCatalog {
        CsvCatalog::new(DataFiles::in_dir(dir), CsvLoader::default(), 20)
    }

    #[tokio::test]
    async fn test_recommendations_for_known_user() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let recs = assert_ok!(catalog(dir.path()).recommendations(7).await);
        assert_eq!(
            recs.user_sorted_movies,
            vec![MovieSummary::new("Inception", "Sci-Fi", "tt1375666")]
        );
        assert_eq!(recs.user_average_movies.len(), 2);
        assert_eq!(
            recs.user_favorite_movies,
            vec![MovieSummary::without_genre("Inception", "tt1375666")]
        );
    }

    #[tokio::test]
    async fn test_average_movies_same_for_every_user() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        let catalog = catalog(dir.path());

        let for_one = catalog.average_movies(1).await.unwrap();
        let for_other = catalog.average_movies(4242).await.unwrap();
        assert_eq!(for_one, for_other);
    }

    #[tokio::test]
    async fn test_unknown_user_gets_empty_personal_lists() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let recs = catalog(dir.path()).recommendations(999).await.unwrap();
        assert!(recs.user_sorted_movies.is_empty());
        assert!(recs.user_favorite_movies.is_empty());
        assert!(!recs.user_average_movies.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = assert_err!(catalog(dir.path()).sorted_movies(1).await);
        assert!(matches!(result, AppError::Io(_)));
    }

    #[tokio::test]
    async fn test_cached_catalog_sees_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        let catalog = catalog(dir.path()).with_cache(DatasetCache::new());

        assert_eq!(catalog.sorted_movies(2).await.unwrap().len(), 0);

        let updated = format!(
            "{}2,\"[{{'title': 'Heat', 'genre': 'Action', 'imdbId': 'tt0113277'}}]\"\n",
            RATINGS
        );
        std::fs::write(&catalog.files().sorted_movies, updated).unwrap();

        assert_eq!(catalog.sorted_movies(2).await.unwrap().len(), 1);
    }

    #[test]
    fn test_data_files_in_dir() {
        let files = DataFiles::in_dir("/srv/data");
        assert_eq!(files.sorted_movies, Path::new("/srv/data/sorted_movies_by_rating.csv"));
        assert_eq!(files.average_movies, Path::new("/srv/data/average_merged_movies.csv"));
        assert_eq!(
            files.favorites,
            Path::new("/srv/data/user_favorite_genres_and_movies.csv")
        );
    }
}
