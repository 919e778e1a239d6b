use anyhow::anyhow;
use clap::Parser;
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use log::LevelFilter;
use std::env;
use time::{format_description::well_known::Iso8601, OffsetDateTime};
use weather_etl_core::{find_config_file, load_config, ConfigSource, DEFAULT_DATA_DIR};

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "Weather ETL - seeds geocoded cities, ingests hourly readings, prints reports"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $WEATHER_ETL_CONFIG, ./pipeline.toml,
    /// $XDG_CONFIG_HOME/weather-etl/pipeline.toml, /etc/weather-etl/pipeline.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "WEATHER_ETL_LEVEL")]
    pub level: Option<String>,

    /// Directory holding the SQLite database file
    #[arg(short, long, env = "WEATHER_ETL_DATA_DIR")]
    pub data_dir: Option<String>,

    /// OpenWeatherMap API key, shared by the geocoding and weather endpoints
    #[arg(short = 'k', long, env = "WEATHER_ETL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl Cli {
    pub fn data_dir(&self) -> String {
        self.data_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
    }

    /// The required API secret. Never logged.
    pub fn api_key(&self) -> anyhow::Result<String> {
        self.api_key.clone().ok_or_else(|| {
            anyhow!(
                "no OpenWeatherMap API key configured; \
                 set WEATHER_ETL_API_KEY (or api_key in the config file)"
            )
        })
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("WEATHER_ETL_CONFIG", "pipeline.toml")
    };

    if let Some(path) = source.path() {
        log::info!("Loading config from: {}", path.display());
    }

    let file_config: Cli = load_config(&source).unwrap_or_default();

    // CLI args override file config (env vars are handled by clap)
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        data_dir: cli_args.data_dir.or(file_config.data_dir),
        api_key: cli_args.api_key.or(file_config.api_key),
    }
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}: {}",
                OffsetDateTime::now_utc()
                    .format(&Iso8601::DEFAULT)
                    .unwrap_or_default(),
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}
