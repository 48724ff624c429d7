pub mod cache;
pub mod csv_loader;

pub use cache::DatasetCache;
pub use csv_loader::{CsvLoader, FieldSizeLimit};

use crate::error::{AppError, AppResult};

/// Runs blocking file work on tokio's blocking pool
pub async fn run_blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}
