use std::path::PathBuf;

use serde::Deserialize;

use crate::data::FieldSizeLimit;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the recommendation CSV files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_sorted_movies_file")]
    pub sorted_movies_file: String,

    #[serde(default = "default_average_movies_file")]
    pub average_movies_file: String,

    #[serde(default = "default_favorites_file")]
    pub favorites_file: String,

    /// Maximum entries in the rated and average lists
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// First field size limit tried when reading CSV files
    #[serde(default = "default_max_field_size")]
    pub max_field_size: u64,

    /// Smallest field size limit tried before giving up
    #[serde(default = "default_min_field_size")]
    pub min_field_size: u64,

    /// Keep loaded files in memory until they change on disk
    #[serde(default)]
    pub cache_datasets: bool,

    /// Directory with `index.html` and `results.html` overriding the
    /// built-in templates
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_sorted_movies_file() -> String {
    "sorted_movies_by_rating.csv".to_string()
}

fn default_average_movies_file() -> String {
    "average_merged_movies.csv".to_string()
}

fn default_favorites_file() -> String {
    "user_favorite_genres_and_movies.csv".to_string()
}

fn default_result_limit() -> usize {
    20
}

fn default_max_field_size() -> u64 {
    i64::MAX as u64
}

fn default_min_field_size() -> u64 {
    1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            sorted_movies_file: default_sorted_movies_file(),
            average_movies_file: default_average_movies_file(),
            favorites_file: default_favorites_file(),
            result_limit: default_result_limit(),
            max_field_size: default_max_field_size(),
            min_field_size: default_min_field_size(),
            cache_datasets: false,
            templates_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn field_size_limit(&self) -> FieldSizeLimit {
        FieldSizeLimit::new(self.max_field_size, self.min_field_size)
    }
}
