mod csv_row;
mod movie;

pub use csv_row::CsvRow;
pub use movie::{MovieSummary, Recommendations};

/// Integer key identifying a user across the recommendation files
pub type UserId = i64;
