use anyhow::Result;
use log::info;
use pipeline::{
    api::OpenWeatherClient,
    db::Database,
    etl::{ingest_hourly_weather, seed_cities, seed_country},
    get_config_info, get_log_level, reports, setup_logger,
};
use time::{Duration, OffsetDateTime};
use weather_etl_core::create_dir_all;

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file is honored for the API key and other settings
    dotenvy::dotenv().ok();

    let cli = get_config_info();
    let log_level = get_log_level(&cli);

    setup_logger()
        .level(log_level)
        .level_for("sqlx", log::LevelFilter::Warn)
        .level_for("pipeline", log_level)
        .apply()?;

    let api_key = cli.api_key()?;
    let data_dir = cli.data_dir();

    info!("Weather ETL starting...");
    info!("  Data dir: {}", data_dir);

    create_dir_all(&data_dir)?;

    let db = Database::new(&data_dir).await?;
    db.health_check().await?;

    let client = OpenWeatherClient::new(api_key);

    seed_country(&db).await?;
    seed_cities(&db, &client).await?;

    let now = OffsetDateTime::now_utc();
    ingest_hourly_weather(&db, &client, now).await?;

    run_reports(&db, now).await?;

    Ok(())
}

/// The fixed report set, over a rolling 24-hour window ending now.
async fn run_reports(db: &Database, now: OffsetDateTime) -> Result<()> {
    let initial_time = now - Duration::hours(24);
    let final_time = now;

    let distinct = reports::distinct_weather_conditions(db, initial_time, final_time).await?;
    info!("Distinct weather conditions in the last 24 hours: {distinct:?}");

    let most_common = reports::most_common_condition_per_city(db, initial_time, final_time).await?;
    info!("Most common weather condition per city in the last 24 hours: {most_common:?}");

    let averages = reports::average_temperature_per_city(db, initial_time, final_time).await?;
    info!("Average temperature per city in the last 24 hours: {averages:?}");

    let highest_temp = reports::highest_value_city(
        db,
        reports::RankColumn::Temperature,
        initial_time,
        final_time,
    )
    .await?;
    info!("City with highest absolute temperature in the last 24 hours: {highest_temp:?}");

    let variation = reports::highest_daily_variation_city(db, initial_time, final_time).await?;
    info!("City with highest daily temperature variation in the last 24 hours: {variation:?}");

    let highest_wind = reports::highest_value_city(
        db,
        reports::RankColumn::WindSpeed,
        initial_time,
        final_time,
    )
    .await?;
    info!("City with highest wind speed in the last 24 hours: {highest_wind:?}");

    Ok(())
}
