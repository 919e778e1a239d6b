//! Read-only aggregate reports over the hourly weather history.
//!
//! Each report pulls the windowed rows in one query and aggregates them in
//! memory. That is fine for a handful of cities polled hourly but is not
//! built to scale; push the aggregation into SQL before pointing this at a
//! large table.
//!
//! Cardinality differs deliberately between reports: the most-common
//! condition is ranked within each city (one or more rows per city), while
//! highest value and highest daily variation rank globally across all
//! cities (top-1 overall, ties retained).

use std::collections::HashMap;

use itertools::Itertools;
use time::{Date, OffsetDateTime};

use crate::db::{self, CityHour, Database};

/// Numeric column a ranking report can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankColumn {
    Temperature,
    WindSpeed,
}

impl RankColumn {
    fn value(&self, row: &CityHour) -> f64 {
        match self {
            RankColumn::Temperature => row.temperature,
            RankColumn::WindSpeed => row.wind_speed,
        }
    }
}

impl std::fmt::Display for RankColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankColumn::Temperature => write!(f, "temperature"),
            RankColumn::WindSpeed => write!(f, "wind_speed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionCount {
    pub city: String,
    pub weather_condition: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityAverage {
    pub city: String,
    pub average_temperature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityValue {
    pub city: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyVariation {
    pub city: String,
    pub date: Date,
    pub variation: f64,
}

/// Unique weather conditions in the window, sorted, no city grouping.
pub async fn distinct_weather_conditions(
    db: &Database,
    initial_time: OffsetDateTime,
    final_time: OffsetDateTime,
) -> Result<Vec<String>, db::Error> {
    let rows = db.hourly_history(initial_time, final_time).await?;
    Ok(distinct_conditions(&rows))
}

/// The most frequent condition(s) for each city in the window. Ties share
/// the top rank and are all retained, so a city can appear more than once.
pub async fn most_common_condition_per_city(
    db: &Database,
    initial_time: OffsetDateTime,
    final_time: OffsetDateTime,
) -> Result<Vec<ConditionCount>, db::Error> {
    let rows = db.hourly_history(initial_time, final_time).await?;
    Ok(rank_conditions(&rows))
}

/// Mean temperature per city in the window.
pub async fn average_temperature_per_city(
    db: &Database,
    initial_time: OffsetDateTime,
    final_time: OffsetDateTime,
) -> Result<Vec<CityAverage>, db::Error> {
    let rows = db.hourly_history(initial_time, final_time).await?;
    Ok(mean_temperatures(&rows))
}

/// The city/value pair(s) achieving the single highest magnitude of
/// `column` across the whole window. Global, not per city; the reported
/// value keeps its sign.
pub async fn highest_value_city(
    db: &Database,
    column: RankColumn,
    initial_time: OffsetDateTime,
    final_time: OffsetDateTime,
) -> Result<Vec<CityValue>, db::Error> {
    let rows = db.hourly_history(initial_time, final_time).await?;
    Ok(top_magnitude(&rows, column))
}

/// The (city, UTC date) group(s) with the single highest intraday
/// temperature variation (max - min) across the whole window. Global, not
/// per city.
pub async fn highest_daily_variation_city(
    db: &Database,
    initial_time: OffsetDateTime,
    final_time: OffsetDateTime,
) -> Result<Vec<DailyVariation>, db::Error> {
    let rows = db.hourly_history(initial_time, final_time).await?;
    Ok(top_daily_variation(&rows))
}

fn distinct_conditions(rows: &[CityHour]) -> Vec<String> {
    rows.iter()
        .map(|row| row.weather_condition.clone())
        .unique()
        .sorted()
        .collect()
}

fn rank_conditions(rows: &[CityHour]) -> Vec<ConditionCount> {
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for row in rows {
        *counts
            .entry((row.city.clone(), row.weather_condition.clone()))
            .or_default() += 1;
    }

    let mut top_per_city: HashMap<String, usize> = HashMap::new();
    for ((city, _), count) in &counts {
        let top = top_per_city.entry(city.clone()).or_default();
        *top = (*top).max(*count);
    }

    counts
        .into_iter()
        .filter(|((city, _), count)| top_per_city[city] == *count)
        .map(|((city, weather_condition), count)| ConditionCount {
            city,
            weather_condition,
            count,
        })
        .sorted_by(|a, b| (&a.city, &a.weather_condition).cmp(&(&b.city, &b.weather_condition)))
        .collect()
}

fn mean_temperatures(rows: &[CityHour]) -> Vec<CityAverage> {
    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for row in rows {
        let entry = sums.entry(row.city.clone()).or_insert((0.0, 0));
        entry.0 += row.temperature;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(city, (sum, count))| CityAverage {
            city,
            average_temperature: sum / count as f64,
        })
        .sorted_by(|a, b| a.city.cmp(&b.city))
        .collect()
}

fn top_magnitude(rows: &[CityHour], column: RankColumn) -> Vec<CityValue> {
    let Some(max_magnitude) = rows
        .iter()
        .map(|row| column.value(row).abs())
        .max_by(f64::total_cmp)
    else {
        return vec![];
    };

    rows.iter()
        .filter(|row| column.value(row).abs() == max_magnitude)
        .map(|row| CityValue {
            city: row.city.clone(),
            value: column.value(row),
        })
        .sorted_by(|a, b| a.city.cmp(&b.city).then(a.value.total_cmp(&b.value)))
        .dedup()
        .collect()
}

fn top_daily_variation(rows: &[CityHour]) -> Vec<DailyVariation> {
    let mut ranges: HashMap<(String, Date), (f64, f64)> = HashMap::new();
    for row in rows {
        let key = (row.city.clone(), row.hourly_timestamp.date());
        let range = ranges
            .entry(key)
            .or_insert((row.temperature, row.temperature));
        range.0 = range.0.min(row.temperature);
        range.1 = range.1.max(row.temperature);
    }

    let Some(max_variation) = ranges
        .values()
        .map(|(min, max)| max - min)
        .max_by(f64::total_cmp)
    else {
        return vec![];
    };

    ranges
        .into_iter()
        .filter(|(_, (min, max))| max - min == max_variation)
        .map(|((city, date), (min, max))| DailyVariation {
            city,
            date,
            variation: max - min,
        })
        .sorted_by(|a, b| (&a.city, a.date).cmp(&(&b.city, b.date)))
        .collect()
}
