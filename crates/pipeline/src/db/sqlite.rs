use anyhow::{Context, Result};
use log::info;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::{path::Path, str::FromStr, time::Duration};
use time::OffsetDateTime;
use tokio::fs::create_dir_all;

use weather_etl_core::DATABASE_FILE;

use super::{City, CityCoordinates, CityHour, Country, Error, HourlyReading, NewCity};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the SQLite database under `path` and run
    /// the embedded migrations. The pool is capped at one connection: the
    /// pipeline is strictly sequential and the schema assumes a single
    /// writer.
    pub async fn new(path: &str) -> Result<Self> {
        let db_path = format!("{}/{}", path, DATABASE_FILE);

        if let Some(parent) = Path::new(&db_path).parent() {
            create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create database directory: {parent:?}"))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))?
            .create_if_missing(true)
            .pragma("journal_mode", "WAL")
            .pragma("synchronous", "NORMAL")
            .pragma("busy_timeout", "5000")
            .pragma("foreign_keys", "ON")
            .pragma("temp_store", "MEMORY");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let db = Self { pool };

        db.run_migrations().await?;
        info!("SQLite database initialized at: {}", db_path);

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check database connectivity and integrity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database connectivity check failed")?;

        let result: String = sqlx::query_scalar("PRAGMA quick_check;")
            .fetch_one(&self.pool)
            .await
            .context("Database integrity check failed")?;
        if result != "ok" {
            return Err(anyhow::anyhow!(
                "Database integrity check failed: {}",
                result
            ));
        }

        Ok(())
    }

    /// Insert a country if absent; a conflict on the unique name is a no-op.
    pub async fn insert_country_if_absent(&self, name: &str, iso_3166: &str) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO country (name, iso_3166) VALUES (?, ?)
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(name)
        .bind(iso_3166.to_uppercase())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_city_by_name(&self, name: &str) -> Result<Option<City>, Error> {
        let row = sqlx::query(
            "SELECT id, country_id, name, latitude, longitude FROM city WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| City {
            id: row.get("id"),
            country_id: row.get("country_id"),
            name: row.get("name"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
        }))
    }

    /// Look up a country by name, expecting exactly one row.
    pub async fn country_by_name(&self, name: &str) -> Result<Country, Error> {
        let rows = sqlx::query("SELECT id, iso_3166, name FROM country WHERE name = ?")
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

        let row = expect_one(rows, "country", name)?;
        Ok(Country {
            id: row.get("id"),
            iso_3166: row.get("iso_3166"),
            name: row.get("name"),
        })
    }

    /// Append a raw geocoding response to the bronze city table. Commits
    /// immediately so the audit trail survives a later failure in the
    /// seeding loop.
    pub async fn insert_city_bronze(
        &self,
        country_id: i64,
        name: &str,
        payload: &Value,
    ) -> Result<(), Error> {
        sqlx::query("INSERT INTO city_bronze (country_id, name, payload) VALUES (?, ?, ?)")
            .bind(country_id)
            .bind(name)
            .bind(serde_json::to_string(payload)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Apply all staged city rows in one transaction.
    pub async fn insert_cities(&self, cities: &[NewCity]) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        for city in cities {
            sqlx::query(
                "INSERT INTO city (country_id, name, latitude, longitude) VALUES (?, ?, ?, ?)",
            )
            .bind(city.country_id)
            .bind(&city.name)
            .bind(city.latitude)
            .bind(city.longitude)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Joined city/country lookup by both names, expecting exactly one row.
    /// Fails if the city has not been seeded yet.
    pub async fn city_coordinates(
        &self,
        city_name: &str,
        country_name: &str,
    ) -> Result<CityCoordinates, Error> {
        let rows = sqlx::query(
            "SELECT c.id, c.latitude, c.longitude
             FROM city c
             JOIN country co ON co.id = c.country_id
             WHERE c.name = ? AND co.name = ?",
        )
        .bind(city_name)
        .bind(country_name)
        .fetch_all(&self.pool)
        .await?;

        let row = expect_one(rows, "city", &format!("{}, {}", city_name, country_name))?;
        Ok(CityCoordinates {
            city_id: row.get("id"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
        })
    }

    /// Append a raw weather response to the bronze weather table. Always
    /// inserts, never deduplicates; committed immediately.
    pub async fn insert_weather_bronze(
        &self,
        city_id: i64,
        hourly_timestamp: OffsetDateTime,
        payload: &Value,
    ) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO hourly_weather_bronze (city_id, hourly_timestamp, payload)
             VALUES (?, ?, ?)",
        )
        .bind(city_id)
        .bind(hourly_timestamp.unix_timestamp())
        .bind(serde_json::to_string(payload)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Apply all staged hourly readings in one transaction, keyed on
    /// (city_id, hourly_timestamp): a repeat reading for the same city and
    /// hour updates the measured fields in place.
    pub async fn upsert_hourly_readings(&self, readings: &[HourlyReading]) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        for reading in readings {
            sqlx::query(
                "INSERT INTO hourly_weather
                     (city_id, hourly_timestamp, temperature, wind_speed, weather_condition)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(city_id, hourly_timestamp) DO UPDATE SET
                     temperature = excluded.temperature,
                     wind_speed = excluded.wind_speed,
                     weather_condition = excluded.weather_condition,
                     updated_at = unixepoch()",
            )
            .bind(reading.city_id)
            .bind(reading.hourly_timestamp.unix_timestamp())
            .bind(reading.temperature)
            .bind(reading.wind_speed)
            .bind(&reading.weather_condition)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Hourly readings joined to their city name, filtered to the window
    /// `[initial_time, final_time]` inclusive on both ends.
    pub async fn hourly_history(
        &self,
        initial_time: OffsetDateTime,
        final_time: OffsetDateTime,
    ) -> Result<Vec<CityHour>, Error> {
        let rows = sqlx::query(
            "SELECT c.name, hw.hourly_timestamp, hw.temperature, hw.wind_speed,
                    hw.weather_condition
             FROM hourly_weather hw
             JOIN city c ON c.id = hw.city_id
             WHERE hw.hourly_timestamp >= ? AND hw.hourly_timestamp <= ?
             ORDER BY hw.hourly_timestamp",
        )
        .bind(initial_time.unix_timestamp())
        .bind(final_time.unix_timestamp())
        .fetch_all(&self.pool)
        .await?;

        let mut history = Vec::with_capacity(rows.len());
        for row in rows {
            let ts: i64 = row.get("hourly_timestamp");
            history.push(CityHour {
                city: row.get("name"),
                hourly_timestamp: OffsetDateTime::from_unix_timestamp(ts)?,
                temperature: row.get("temperature"),
                wind_speed: row.get("wind_speed"),
                weather_condition: row.get("weather_condition"),
            });
        }

        Ok(history)
    }
}

fn expect_one(rows: Vec<SqliteRow>, entity: &'static str, key: &str) -> Result<SqliteRow, Error> {
    let found = rows.len();
    let mut rows = rows;
    match rows.pop() {
        Some(row) if found == 1 => Ok(row),
        _ => Err(Error::RowCount {
            entity,
            key: key.to_string(),
            found,
        }),
    }
}
