use serde::Serialize;

/// Minimal movie record handed to the views
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MovieSummary {
    /// Display title (e.g., "Inception (2010)")
    pub title: String,
    /// Pipe-separated genres; absent for favorites
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// IMDB identifier as stored in the source data
    #[serde(rename = "imdbId")]
    pub imdb_id: String,
}

impl MovieSummary {
    /// Creates a summary carrying a genre
    pub fn new(title: impl Into<String>, genre: impl Into<String>, imdb_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            genre: Some(genre.into()),
            imdb_id: imdb_id.into(),
        }
    }

    /// Creates a summary without a genre
    pub fn without_genre(title: impl Into<String>, imdb_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            genre: None,
            imdb_id: imdb_id.into(),
        }
    }
}

/// The three lists rendered on the results page
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Recommendations {
    pub user_sorted_movies: Vec<MovieSummary>,
    pub user_average_movies: Vec<MovieSummary>,
    pub user_favorite_movies: Vec<MovieSummary>,
}
