use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One CSV record viewed as a column-name to value mapping.
///
/// Headers are shared by every row loaded from the same file. Iteration
/// follows header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl CsvRow {
    /// Builds a row; values past the last header are dropped
    pub fn new(headers: Arc<[String]>, mut values: Vec<String>) -> Self {
        values.truncate(headers.len());
        Self { headers, values }
    }

    /// Value of `column`. With duplicate headers the last one wins.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.iter()
            .filter(|(name, _)| *name == column)
            .last()
            .map(|(_, value)| value)
    }

    /// Column names present in this row
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .take(self.values.len())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys().zip(self.values.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for CsvRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Arc<[String]> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_by_column_name() {
        let row = CsvRow::new(headers(&["userId", "movies"]), vec!["7".into(), "[]".into()]);
        assert_eq!(row.get("userId"), Some("7"));
        assert_eq!(row.get("movies"), Some("[]"));
        assert_eq!(row.get("rating"), None);
    }

    #[test]
    fn test_short_row_exposes_only_present_columns() {
        let row = CsvRow::new(headers(&["title", "genre", "imdbId"]), vec!["Heat".into()]);
        assert_eq!(row.len(), 1);
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["title"]);
        assert_eq!(row.get("genre"), None);
    }

    #[test]
    fn test_extra_values_are_dropped() {
        let row = CsvRow::new(headers(&["a"]), vec!["1".into(), "2".into()]);
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let row = CsvRow::new(headers(&["id", "id"]), vec!["1".into(), "2".into()]);
        assert_eq!(row.get("id"), Some("2"));
    }

    #[test]
    fn test_serializes_as_map() {
        let row = CsvRow::new(headers(&["title", "imdbId"]), vec!["Heat".into(), "tt0113277".into()]);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Heat", "imdbId": "tt0113277"}));
    }
}
