use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::Value;
use time::{Duration, OffsetDateTime};

use crate::api::{CurrentWeather, CurrentWeatherData};
use crate::db::{Database, HourlyReading};

use super::SEED_CITIES;

/// Readings older than this are recorded in bronze but not normalized.
pub const STALE_READING_CUTOFF: Duration = Duration::days(3);

/// Fetch the current weather for every seeded city and persist it. The raw
/// response always lands in the bronze table (committed immediately); the
/// normalized reading is staged unless stale, and all staged readings are
/// upserted in one transaction after the loop. `now` is a parameter so the
/// staleness guard is testable.
pub async fn ingest_hourly_weather(
    db: &Database,
    weather: &dyn CurrentWeatherData,
    now: OffsetDateTime,
) -> Result<()> {
    let cutoff = now - STALE_READING_CUTOFF;
    let mut staged: Vec<HourlyReading> = Vec::new();

    for (city_name, country_name) in SEED_CITIES {
        info!("Fetching weather for city: {}", city_name);

        let coordinates = db
            .city_coordinates(city_name, country_name)
            .await
            .with_context(|| format!("city {} not seeded before ingestion", city_name))?;

        let payload = weather
            .current_weather(coordinates.latitude, coordinates.longitude)
            .await?;
        debug!("weather payload for {}: {}", city_name, payload);

        let dt = payload
            .get("dt")
            .and_then(Value::as_i64)
            .with_context(|| format!("weather payload for {} missing `dt` field", city_name))?;
        let hourly_timestamp = truncate_to_hour(dt)
            .with_context(|| format!("weather payload for {} has out-of-range `dt`", city_name))?;

        db.insert_weather_bronze(coordinates.city_id, hourly_timestamp, &payload)
            .await?;

        if hourly_timestamp < cutoff {
            info!(
                "Skipping stale reading at {} for city: {}",
                hourly_timestamp, city_name
            );
            continue;
        }

        let reading: CurrentWeather = serde_json::from_value(payload)
            .with_context(|| format!("malformed weather payload for {}", city_name))?;
        let condition = reading
            .weather
            .first()
            .with_context(|| format!("weather payload for {} has no conditions", city_name))?;

        staged.push(HourlyReading {
            city_id: coordinates.city_id,
            hourly_timestamp,
            temperature: reading.main.temp,
            wind_speed: reading.wind.speed,
            weather_condition: condition.main.clone(),
        });
    }

    db.upsert_hourly_readings(&staged).await?;
    Ok(())
}

/// Truncate a unix timestamp down to the top of its UTC hour.
fn truncate_to_hour(unix_seconds: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp(unix_seconds - unix_seconds.rem_euclid(3600))
}
