//! The two write steps of the pipeline: one-time reference seeding and the
//! per-run hourly ingestion. Both are idempotent, so re-running the whole
//! pipeline after a failure is the recovery mechanism.

mod ingest;
mod seed;

pub use ingest::{ingest_hourly_weather, STALE_READING_CUTOFF};
pub use seed::{seed_cities, seed_country};

/// The single supported country: (name, ISO 3166-1 alpha-2 code).
pub const SEED_COUNTRY: (&str, &str) = ("italy", "IT");

/// The (city, country) pairs processed on every run.
pub const SEED_CITIES: [(&str, &str); 3] = [
    ("milan", "italy"),
    ("bologna", "italy"),
    ("cagliari", "italy"),
];
