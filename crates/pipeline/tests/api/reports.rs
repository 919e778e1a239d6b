use crate::helpers::{seed_all, spawn_db};
use pipeline::db::{Database, HourlyReading};
use pipeline::reports::{
    average_temperature_per_city, distinct_weather_conditions, highest_daily_variation_city,
    highest_value_city, most_common_condition_per_city, RankColumn,
};
use time::{macros::datetime, OffsetDateTime};

async fn city_id(db: &Database, name: &str) -> i64 {
    sqlx::query_scalar("SELECT id FROM city WHERE name = ?")
        .bind(name)
        .fetch_one(db.pool())
        .await
        .expect("city lookup failed")
}

async fn add_reading(
    db: &Database,
    city_id: i64,
    ts: OffsetDateTime,
    temp: f64,
    wind: f64,
    condition: &str,
) {
    db.upsert_hourly_readings(&[HourlyReading {
        city_id,
        hourly_timestamp: ts,
        temperature: temp,
        wind_speed: wind,
        weather_condition: condition.to_string(),
    }])
    .await
    .expect("failed to insert reading");
}

#[tokio::test]
async fn report_window_is_inclusive_on_both_ends() {
    let app = spawn_db().await;
    seed_all(&app.db).await;
    let milan = city_id(&app.db, "milan").await;

    let initial = datetime!(2025-08-10 10:00 UTC);
    let last = datetime!(2025-08-10 12:00 UTC);

    add_reading(&app.db, milan, initial, 10.0, 1.0, "AtStart").await;
    add_reading(&app.db, milan, last, 11.0, 1.0, "AtEnd").await;
    add_reading(&app.db, milan, datetime!(2025-08-10 13:00 UTC), 12.0, 1.0, "After").await;
    add_reading(&app.db, milan, datetime!(2025-08-10 09:00 UTC), 9.0, 1.0, "Before").await;

    let conditions = distinct_weather_conditions(&app.db, initial, last)
        .await
        .unwrap();
    assert_eq!(conditions, vec!["AtEnd", "AtStart"]);
}

#[tokio::test]
async fn most_common_condition_is_ranked_per_city() {
    let app = spawn_db().await;
    seed_all(&app.db).await;
    let milan = city_id(&app.db, "milan").await;
    let bologna = city_id(&app.db, "bologna").await;

    add_reading(&app.db, milan, datetime!(2025-08-10 10:00 UTC), 20.0, 3.0, "Clear").await;
    add_reading(&app.db, milan, datetime!(2025-08-10 11:00 UTC), 21.0, 3.0, "Clear").await;
    add_reading(&app.db, bologna, datetime!(2025-08-10 10:00 UTC), 18.0, 2.0, "Rain").await;

    let ranked = most_common_condition_per_city(
        &app.db,
        datetime!(2025-08-10 10:00 UTC),
        datetime!(2025-08-10 11:00 UTC),
    )
    .await
    .unwrap();

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].city, "bologna");
    assert_eq!(ranked[0].weather_condition, "Rain");
    assert_eq!(ranked[0].count, 1);
    assert_eq!(ranked[1].city, "milan");
    assert_eq!(ranked[1].weather_condition, "Clear");
    assert_eq!(ranked[1].count, 2);
}

#[tokio::test]
async fn average_temperature_is_grouped_by_city() {
    let app = spawn_db().await;
    seed_all(&app.db).await;
    let milan = city_id(&app.db, "milan").await;
    let bologna = city_id(&app.db, "bologna").await;

    add_reading(&app.db, milan, datetime!(2025-08-10 10:00 UTC), 10.0, 3.0, "Clear").await;
    add_reading(&app.db, milan, datetime!(2025-08-10 11:00 UTC), 20.0, 3.0, "Clear").await;
    add_reading(&app.db, bologna, datetime!(2025-08-10 10:00 UTC), 6.0, 2.0, "Rain").await;

    let averages = average_temperature_per_city(
        &app.db,
        datetime!(2025-08-10 00:00 UTC),
        datetime!(2025-08-10 23:00 UTC),
    )
    .await
    .unwrap();

    assert_eq!(averages.len(), 2);
    assert_eq!(averages[0].city, "bologna");
    assert_eq!(averages[0].average_temperature, 6.0);
    assert_eq!(averages[1].city, "milan");
    assert_eq!(averages[1].average_temperature, 15.0);
}

#[tokio::test]
async fn highest_value_reports_are_global_not_per_city() {
    let app = spawn_db().await;
    seed_all(&app.db).await;
    let milan = city_id(&app.db, "milan").await;
    let bologna = city_id(&app.db, "bologna").await;

    add_reading(&app.db, milan, datetime!(2025-08-10 10:00 UTC), 20.0, 9.0, "Clear").await;
    add_reading(&app.db, bologna, datetime!(2025-08-10 10:00 UTC), 8.0, 4.0, "Rain").await;

    let window = (
        datetime!(2025-08-10 00:00 UTC),
        datetime!(2025-08-10 23:00 UTC),
    );

    let top_temp = highest_value_city(&app.db, RankColumn::Temperature, window.0, window.1)
        .await
        .unwrap();
    assert_eq!(top_temp.len(), 1);
    assert_eq!(top_temp[0].city, "milan");
    assert_eq!(top_temp[0].value, 20.0);

    let top_wind = highest_value_city(&app.db, RankColumn::WindSpeed, window.0, window.1)
        .await
        .unwrap();
    assert_eq!(top_wind.len(), 1);
    assert_eq!(top_wind[0].city, "milan");
    assert_eq!(top_wind[0].value, 9.0);
}

#[tokio::test]
async fn highest_daily_variation_selects_the_single_largest_spread() {
    let app = spawn_db().await;
    seed_all(&app.db).await;
    let milan = city_id(&app.db, "milan").await;
    let bologna = city_id(&app.db, "bologna").await;

    add_reading(&app.db, milan, datetime!(2025-08-10 08:00 UTC), 10.0, 3.0, "Clear").await;
    add_reading(&app.db, milan, datetime!(2025-08-10 16:00 UTC), 20.0, 3.0, "Clear").await;
    add_reading(&app.db, bologna, datetime!(2025-08-10 08:00 UTC), 5.0, 2.0, "Rain").await;
    add_reading(&app.db, bologna, datetime!(2025-08-10 16:00 UTC), 8.0, 2.0, "Rain").await;

    let top = highest_daily_variation_city(
        &app.db,
        datetime!(2025-08-10 00:00 UTC),
        datetime!(2025-08-10 23:00 UTC),
    )
    .await
    .unwrap();

    assert_eq!(top.len(), 1);
    assert_eq!(top[0].city, "milan");
    assert_eq!(top[0].variation, 10.0);
}
