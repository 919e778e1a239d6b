use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;

use super::{CurrentWeatherData, Error, GeocodingData, CURRENT_WEATHER_URL, GEOCODING_URL};

/// Shared client for both OpenWeatherMap endpoints.
///
/// No retry and no application-level timeout: a failed call surfaces as an
/// error and aborts the current pipeline step, re-running the pipeline is
/// the recovery path.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl GeocodingData for OpenWeatherClient {
    async fn direct_geocode(&self, city: &str, country_code: &str) -> Result<Vec<Value>, Error> {
        let query = format!("{},{}", city, country_code);
        let response = self
            .http
            .get(GEOCODING_URL)
            .query(&[
                ("q", query.as_str()),
                ("limit", "1"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::GeocodingStatus {
                status,
                city: city.to_string(),
                country: country_code.to_string(),
            });
        }

        let hits: Vec<Value> = response.json().await?;
        debug!("geocoding response for {}: {:?}", query, hits);
        Ok(hits)
    }
}

#[async_trait]
impl CurrentWeatherData for OpenWeatherClient {
    async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<Value, Error> {
        let response = self
            .http
            .get(CURRENT_WEATHER_URL)
            .query(&[
                ("lat", latitude.to_string().as_str()),
                ("lon", longitude.to_string().as_str()),
                ("units", "metric"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::WeatherStatus {
                status,
                latitude,
                longitude,
            });
        }

        let payload: Value = response.json().await?;
        debug!(
            "weather response for lat {}, lon {}: {:?}",
            latitude, longitude, payload
        );
        Ok(payload)
    }
}
