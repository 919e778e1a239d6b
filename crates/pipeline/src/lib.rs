//! Weather ETL pipeline library.
//!
//! One run of the pipeline seeds the reference country/city tables (calling
//! out to a geocoding API for coordinates), ingests the current weather
//! reading for each seeded city, and computes a fixed set of reports over
//! the accumulated hourly history.

pub mod api;
pub mod db;
pub mod etl;
pub mod reports;
mod utils;

pub use utils::{get_config_info, get_log_level, setup_logger, Cli};
