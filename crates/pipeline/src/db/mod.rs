//! SQLite schema access: typed insert/upsert/select operations over the
//! five pipeline tables. Timestamps are stored as unix seconds (UTC),
//! raw payloads as serialized JSON text.

mod sqlite;

pub use sqlite::Database;

use time::OffsetDateTime;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("stored timestamp out of range: {0}")]
    Timestamp(#[from] time::error::ComponentRange),
    #[error("failed to serialize payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("expected exactly one {entity} row for {key}, found {found}")]
    RowCount {
        entity: &'static str,
        key: String,
        found: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Country {
    pub id: i64,
    pub iso_3166: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct City {
    pub id: i64,
    pub country_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A normalized city row staged for insertion during seeding.
#[derive(Debug, Clone)]
pub struct NewCity {
    pub country_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Joined city/country lookup result used by ingestion.
#[derive(Debug, Clone)]
pub struct CityCoordinates {
    pub city_id: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// A normalized hourly reading staged for upsert during ingestion.
#[derive(Debug, Clone)]
pub struct HourlyReading {
    pub city_id: i64,
    pub hourly_timestamp: OffsetDateTime,
    pub temperature: f64,
    pub wind_speed: f64,
    pub weather_condition: String,
}

/// One windowed hourly row joined to its city name, the input of every
/// report aggregation.
#[derive(Debug, Clone)]
pub struct CityHour {
    pub city: String,
    pub hourly_timestamp: OffsetDateTime,
    pub temperature: f64,
    pub wind_speed: f64,
    pub weather_condition: String,
}
