use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::Value;

use crate::api::{GeocodeHit, GeocodingData};
use crate::db::{Database, NewCity};

use super::{SEED_CITIES, SEED_COUNTRY};

/// Insert the supported country if absent.
pub async fn seed_country(db: &Database) -> Result<()> {
    let (name, iso_3166) = SEED_COUNTRY;
    db.insert_country_if_absent(name, iso_3166)
        .await
        .with_context(|| format!("failed to seed country {}", name))?;
    Ok(())
}

/// Seed the hardcoded cities, geocoding each one that is not already
/// present. Raw responses land in the bronze city table immediately;
/// normalized city rows are staged and applied in one transaction after
/// the loop, so a failure mid-loop leaves the audit trail intact and the
/// next run picks up where this one stopped.
pub async fn seed_cities(db: &Database, geocoder: &dyn GeocodingData) -> Result<()> {
    let mut staged: Vec<NewCity> = Vec::new();

    for (city_name, country_name) in SEED_CITIES {
        info!("Processing city: {}, {}", city_name, country_name);

        if db.find_city_by_name(city_name).await?.is_some() {
            info!("City {} already seeded, skipping", city_name);
            continue;
        }

        let country = db
            .country_by_name(country_name)
            .await
            .with_context(|| format!("country {} missing during seeding", country_name))?;

        let hits = geocoder
            .direct_geocode(city_name, &country.iso_3166)
            .await?;
        let first: &Value = hits
            .first()
            .with_context(|| format!("geocoding returned no results for {}", city_name))?;
        debug!("geocoding payload for {}: {}", city_name, first);

        db.insert_city_bronze(country.id, city_name, first).await?;

        let hit: GeocodeHit = serde_json::from_value(first.clone())
            .with_context(|| format!("malformed geocoding payload for {}", city_name))?;

        staged.push(NewCity {
            country_id: country.id,
            name: city_name.to_string(),
            latitude: hit.lat,
            longitude: hit.lon,
        });
        info!(
            "Staged city {} at lat {}, lon {}",
            city_name, hit.lat, hit.lon
        );
    }

    db.insert_cities(&staged).await?;
    Ok(())
}
