use crate::helpers::{count, seed_all, spawn_db, weather_payload, MockWeatherApi};
use pipeline::etl::ingest_hourly_weather;
use time::{Duration, OffsetDateTime};

#[tokio::test]
async fn repeat_ingestion_in_the_same_hour_upserts_the_silver_row() {
    let app = spawn_db().await;
    seed_all(&app.db).await;

    let now = OffsetDateTime::now_utc();
    let dt = now.unix_timestamp();

    let mut first = MockWeatherApi::new();
    first
        .expect_current_weather()
        .times(3)
        .returning(move |_, _| Ok(weather_payload(dt, 10.0, 3.0, "Clear")));
    ingest_hourly_weather(&app.db, &first, now).await.unwrap();

    let mut second = MockWeatherApi::new();
    second
        .expect_current_weather()
        .times(3)
        .returning(move |_, _| Ok(weather_payload(dt, 12.5, 7.5, "Rain")));
    ingest_hourly_weather(&app.db, &second, now).await.unwrap();

    // One silver row per (city, hour), carrying the second call's values
    assert_eq!(count(&app.db, "SELECT COUNT(*) FROM hourly_weather").await, 3);
    let (temp, wind, condition): (f64, f64, String) = sqlx::query_as(
        "SELECT hw.temperature, hw.wind_speed, hw.weather_condition
         FROM hourly_weather hw
         JOIN city c ON c.id = hw.city_id
         WHERE c.name = 'milan'",
    )
    .fetch_one(app.db.pool())
    .await
    .unwrap();
    assert_eq!(temp, 12.5);
    assert_eq!(wind, 7.5);
    assert_eq!(condition, "Rain");
}

#[tokio::test]
async fn bronze_rows_are_appended_never_upserted() {
    let app = spawn_db().await;
    seed_all(&app.db).await;

    let now = OffsetDateTime::now_utc();
    let dt = now.unix_timestamp();

    for _ in 0..2 {
        let mut weather = MockWeatherApi::new();
        weather
            .expect_current_weather()
            .times(3)
            .returning(move |_, _| Ok(weather_payload(dt, 10.0, 3.0, "Clear")));
        ingest_hourly_weather(&app.db, &weather, now).await.unwrap();
    }

    assert_eq!(
        count(&app.db, "SELECT COUNT(*) FROM hourly_weather_bronze").await,
        6
    );
    assert_eq!(count(&app.db, "SELECT COUNT(*) FROM hourly_weather").await, 3);
}

#[tokio::test]
async fn stale_readings_land_in_bronze_but_are_not_normalized() {
    let app = spawn_db().await;
    seed_all(&app.db).await;

    let now = OffsetDateTime::now_utc();
    let stale_dt = (now - Duration::days(4)).unix_timestamp();

    let mut weather = MockWeatherApi::new();
    weather
        .expect_current_weather()
        .times(3)
        .returning(move |_, _| Ok(weather_payload(stale_dt, 10.0, 3.0, "Clear")));
    ingest_hourly_weather(&app.db, &weather, now).await.unwrap();

    assert_eq!(
        count(&app.db, "SELECT COUNT(*) FROM hourly_weather_bronze").await,
        3
    );
    assert_eq!(count(&app.db, "SELECT COUNT(*) FROM hourly_weather").await, 0);
}

#[tokio::test]
async fn ingestion_fails_when_cities_are_not_seeded() {
    let app = spawn_db().await;

    let weather = MockWeatherApi::new();
    let result = ingest_hourly_weather(&app.db, &weather, OffsetDateTime::now_utc()).await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("not seeded"), "unexpected error: {err}");
}

#[tokio::test]
async fn malformed_payload_still_produces_a_bronze_row() {
    let app = spawn_db().await;
    seed_all(&app.db).await;

    let now = OffsetDateTime::now_utc();
    let dt = now.unix_timestamp();

    // `main.temp` missing: normalization must fail after the bronze insert
    let mut weather = MockWeatherApi::new();
    weather.expect_current_weather().returning(move |_, _| {
        Ok(serde_json::json!({
            "dt": dt,
            "wind": { "speed": 3.0 },
            "weather": [ { "main": "Clear" } ],
        }))
    });

    let result = ingest_hourly_weather(&app.db, &weather, now).await;
    assert!(result.is_err());

    assert_eq!(
        count(&app.db, "SELECT COUNT(*) FROM hourly_weather_bronze").await,
        1
    );
    assert_eq!(count(&app.db, "SELECT COUNT(*) FROM hourly_weather").await, 0);
}
