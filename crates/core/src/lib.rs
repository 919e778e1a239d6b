//! Weather ETL Core Library
//!
//! Shared utilities for the pipeline binary:
//! - Configuration file discovery and loading (XDG-compliant)
//! - File system helpers
//! - Common constants

mod config;
pub mod fs;

pub use config::{find_config_file, get_xdg_data_dir, load_config, ConfigSource};
pub use fs::{create_dir_all, path_exists};

/// Application name used for XDG paths
pub const APP_NAME: &str = "weather-etl";

/// Default directory holding the SQLite database file
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Name of the SQLite database file inside the data directory
pub const DATABASE_FILE: &str = "weather.sqlite";
