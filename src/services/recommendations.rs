use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{CsvRow, MovieSummary, UserId},
    services::literal::{display_scalar, parse_literal},
};

const USER_ID_COLUMN: &str = "userId";
const SORTED_MOVIES_COLUMN: &str = "movies";
const FAVORITES_COLUMN: &str = "Movies";

const SORTED_SOURCE: &str = "sorted movies";
const AVERAGE_SOURCE: &str = "average movies";
const FAVORITES_SOURCE: &str = "favorite movies";

/// Movies from the user's row of the ratings file, in stored order.
///
/// The `movies` cell holds a serialized list of `{title, genre, imdbId}`
/// mappings; at most `limit` of them are returned. A user without a row gets
/// an empty list.
pub fn user_sorted_movies(
    rows: &[CsvRow],
    user_id: UserId,
    limit: usize,
) -> AppResult<Vec<MovieSummary>> {
    let Some(row) = find_user_row(rows, user_id, SORTED_SOURCE)? else {
        return Ok(Vec::new());
    };

    let movies = parse_literal(column(row, SORTED_MOVIES_COLUMN, SORTED_SOURCE)?)?;
    list(&movies, SORTED_SOURCE)?
        .iter()
        .take(limit)
        .map(|entry| summary_from_entry(entry, true, SORTED_SOURCE))
        .collect()
}

/// The first `limit` rows of the averages file.
///
/// The file is global, so every user gets the same list.
pub fn average_movies(rows: &[CsvRow], limit: usize) -> AppResult<Vec<MovieSummary>> {
    rows.iter()
        .take(limit)
        .map(|row| {
            Ok(MovieSummary::new(
                column(row, "title", AVERAGE_SOURCE)?,
                column(row, "genre", AVERAGE_SOURCE)?,
                column(row, "imdbId", AVERAGE_SOURCE)?,
            ))
        })
        .collect()
}

/// Favorite movies from the user's row of the favorites file.
///
/// The `Movies` cell is a list whose first element is the list of favorite
/// movie mappings. Summaries carry no genre.
pub fn user_favorite_movies(rows: &[CsvRow], user_id: UserId) -> AppResult<Vec<MovieSummary>> {
    let Some(row) = find_user_row(rows, user_id, FAVORITES_SOURCE)? else {
        return Ok(Vec::new());
    };

    let value = parse_literal(column(row, FAVORITES_COLUMN, FAVORITES_SOURCE)?)?;
    let first = list(&value, FAVORITES_SOURCE)?.first().ok_or_else(|| {
        AppError::malformed_row(FAVORITES_SOURCE, format!("empty '{}' list", FAVORITES_COLUMN))
    })?;

    list(first, FAVORITES_SOURCE)?
        .iter()
        .map(|entry| summary_from_entry(entry, false, FAVORITES_SOURCE))
        .collect()
}

/// Linear scan for the first row whose `userId` equals `user_id`.
///
/// Rows before the match must carry an integer `userId`.
fn find_user_row<'a>(
    rows: &'a [CsvRow],
    user_id: UserId,
    source: &str,
) -> AppResult<Option<&'a CsvRow>> {
    for row in rows {
        let raw = column(row, USER_ID_COLUMN, source)?;
        let row_user: UserId = raw.trim().parse().map_err(|_| {
            AppError::malformed_row(source, format!("userId '{}' is not an integer", raw))
        })?;
        if row_user == user_id {
            return Ok(Some(row));
        }
    }
    Ok(None)
}

fn column<'a>(row: &'a CsvRow, name: &str, source: &str) -> AppResult<&'a str> {
    row.get(name)
        .ok_or_else(|| AppError::malformed_row(source, format!("missing column '{}'", name)))
}

fn list<'a>(value: &'a Value, source: &str) -> AppResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| AppError::malformed_row(source, "serialized value is not a list"))
}

fn summary_from_entry(entry: &Value, with_genre: bool, source: &str) -> AppResult<MovieSummary> {
    let field = |key: &str| {
        entry
            .get(key)
            .map(display_scalar)
            .ok_or_else(|| AppError::malformed_row(source, format!("movie entry without '{}'", key)))
    };

    if !entry.is_object() {
        return Err(AppError::malformed_row(source, "movie entry is not a mapping"));
    }

    let title = field("title")?;
    let imdb_id = field("imdbId")?;
    Ok(if with_genre {
        MovieSummary::new(title, field("genre")?, imdb_id)
    } else {
        MovieSummary::without_genre(title, imdb_id)
    })
}
