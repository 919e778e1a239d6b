//! Clients for the two OpenWeatherMap endpoints the pipeline depends on.
//!
//! Both traits are object safe so tests can substitute mocks for the real
//! HTTP client. Raw responses are passed around as loosely typed
//! [`serde_json::Value`]s (they land in the bronze tables verbatim); the
//! typed views below are deserialized only at the point of normalization.

mod client;

pub use client::OpenWeatherClient;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

pub const GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
pub const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("request to OpenWeatherMap failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("geocoding API returned status {status} for city {city}, country {country}")]
    GeocodingStatus {
        status: StatusCode,
        city: String,
        country: String,
    },
    #[error("weather API returned status {status} for lat {latitude}, lon {longitude}")]
    WeatherStatus {
        status: StatusCode,
        latitude: f64,
        longitude: f64,
    },
}

/// Resolves a (city, country code) pair to geocoding results.
#[async_trait]
pub trait GeocodingData: Send + Sync {
    /// One HTTP GET against the direct-geocoding endpoint with a result
    /// limit of 1. Returns the parsed JSON array; fails on non-200.
    async fn direct_geocode(&self, city: &str, country_code: &str) -> Result<Vec<Value>, Error>;
}

/// Resolves coordinates to a current-weather snapshot.
#[async_trait]
pub trait CurrentWeatherData: Send + Sync {
    /// One HTTP GET against the current-weather endpoint in metric units.
    /// Returns the parsed JSON object; fails on non-200.
    async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<Value, Error>;
}

/// Typed view of one entry in a direct-geocoding response.
#[derive(Debug, Deserialize)]
pub struct GeocodeHit {
    pub lat: f64,
    pub lon: f64,
}

/// Typed view of a current-weather response, covering only the fields the
/// normalized hourly table needs.
#[derive(Debug, Deserialize)]
pub struct CurrentWeather {
    pub main: MainReading,
    pub wind: Wind,
    pub weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
pub struct MainReading {
    pub temp: f64,
}

#[derive(Debug, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub main: String,
}
