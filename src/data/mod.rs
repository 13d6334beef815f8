//! Data layer: CSV loading and column mapping.
//!
//! Turns a file on disk into a [`RawTable`] and projects two of its columns
//! into a sorted, deduplicated [`ForecastTable`].

mod loader;
mod mapper;
mod models;

pub use loader::{expand_path, load_csv};
pub use mapper::map_columns;
pub use models::{format_number, ForecastTable, Observation, RawTable, TIMESTAMP_FORMAT};
