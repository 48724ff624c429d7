use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::{AppError, AppResult},
    models::CsvRow,
};

/// Bounds for the per-field size limit used while reading CSV files.
///
/// Loading starts at `initial`. A limit above `ceiling` (or wider than the
/// platform's `usize`) is rejected by the reader, in which case it is divided
/// by 10 and the file is read again. Dropping below `floor` is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSizeLimit {
    pub initial: u64,
    pub floor: u64,
    pub ceiling: u64,
}

impl Default for FieldSizeLimit {
    fn default() -> Self {
        Self {
            initial: i64::MAX as u64,
            floor: 1024,
            ceiling: isize::MAX as u64,
        }
    }
}

impl FieldSizeLimit {
    /// Creates limits with the platform ceiling
    pub fn new(initial: u64, floor: u64) -> Self {
        Self {
            initial,
            floor,
            ..Self::default()
        }
    }

    pub fn with_ceiling(mut self, ceiling: u64) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Returns the limit as a `usize` if the reader accepts it
    fn accept(&self, limit: u64) -> Option<usize> {
        if limit > self.ceiling {
            return None;
        }
        usize::try_from(limit).ok()
    }
}

/// Outcome of a single read attempt
enum Attempt {
    LimitRejected,
    Failed(AppError),
}

/// Reads header-driven CSV files into [`CsvRow`]s
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    limit: FieldSizeLimit,
}

impl CsvLoader {
    pub fn new(limit: FieldSizeLimit) -> Self {
        Self { limit }
    }

    /// Loads every row of the file at `path`, in file order.
    ///
    /// Retries with a 10x smaller field-size limit while the current one is
    /// rejected, and fails with [`AppError::FieldLimitExhausted`] once the
    /// next candidate would fall below the floor.
    pub fn load(&self, path: impl AsRef<Path>) -> AppResult<Vec<CsvRow>> {
        let path = path.as_ref();
        let mut limit = self.limit.initial;

        loop {
            match self.try_load(path, limit) {
                Ok(rows) => {
                    tracing::debug!(
                        path = %path.display(),
                        rows = rows.len(),
                        field_limit = limit,
                        "Loaded CSV file"
                    );
                    return Ok(rows);
                }
                Err(Attempt::LimitRejected) => {
                    let next = limit / 10;
                    if next < self.limit.floor {
                        return Err(AppError::FieldLimitExhausted {
                            path: path.to_path_buf(),
                            floor: self.limit.floor,
                        });
                    }
                    tracing::debug!(
                        path = %path.display(),
                        rejected = limit,
                        next,
                        "Field size limit rejected, retrying"
                    );
                    limit = next;
                }
                Err(Attempt::Failed(e)) => return Err(e),
            }
        }
    }

    fn try_load(&self, path: &Path, limit: u64) -> Result<Vec<CsvRow>, Attempt> {
        let limit = self.limit.accept(limit).ok_or(Attempt::LimitRejected)?;
        let file = File::open(path).map_err(|e| Attempt::Failed(e.into()))?;
        read_rows(BufReader::new(file), path, limit).map_err(Attempt::Failed)
    }
}

/// Parses CSV text with a header row, enforcing `limit` characters per field.
///
/// `source` only labels errors.
pub fn read_rows<R: Read>(reader: R, source: &Path, limit: usize) -> AppResult<Vec<CsvRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header_record = reader.headers()?.clone();
    check_fields(&header_record, source, limit)?;
    let headers: Arc<[String]> = header_record.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        check_fields(&record, source, limit)?;
        rows.push(CsvRow::new(
            headers.clone(),
            record.iter().map(str::to_string).collect(),
        ));
    }

    Ok(rows)
}

fn check_fields(record: &csv::StringRecord, source: &Path, limit: usize) -> AppResult<()> {
    let oversized = record
        .iter()
        .any(|field| field.len() > limit && field.chars().count() > limit);
    if oversized {
        return Err(AppError::FieldTooLarge {
            path: PathBuf::from(source),
            line: record.position().map(|p| p.line()).unwrap_or(1),
            limit: limit as u64,
        });
    }
    Ok(())
}
