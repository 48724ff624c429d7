pub mod catalog;
pub mod literal;
pub mod recommendations;

pub use catalog::{CsvCatalog, DataFiles, MovieCatalog};

#[cfg(test)]
pub use catalog::MockMovieCatalog;
