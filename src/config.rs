//! Run configuration: which locations to collect, how, and where to store them.
//!
//! Everything except the API credential can come from an optional TOML file;
//! missing keys fall back to the defaults below. The credential is read from
//! the environment only and never from the file.

use crate::forecast_api::client::{DEFAULT_BASE_URL, DEFAULT_COUNTRY, DEFAULT_FORECAST_DAYS};
use crate::types::table_format::TableFormat;
use crate::utils::default_output_dir;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the WeatherAPI key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";
/// Environment variable pointing at an optional TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "WEATHER_COLLECTOR_CONFIG";

// WeatherAPI serves at most 14 forecast days.
const MAX_FORECAST_DAYS: u32 = 14;

const DEFAULT_LOCATIONS: [&str; 15] = [
    "Manchester",
    "London",
    "Birmingham",
    "Liverpool",
    "Leeds",
    "Newcastle",
    "Sheffield",
    "Bristol",
    "Edinburgh",
    "Glasgow",
    "Cardiff",
    "Belfast",
    "Rochdale",
    "Brighton",
    "Oxford",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Environment variable {0} is not set")]
    MissingApiKey(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Locations in collection order.
    pub locations: Vec<String>,
    /// Qualifier appended to each location in the API query.
    pub country: String,
    /// Number of days to request, including today.
    pub forecast_days: u32,
    /// Pause between consecutive requests.
    pub request_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub base_url: String,
    pub output_dir: PathBuf,
    /// Format of snapshots and the exported master file.
    pub table_format: TableFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            locations: DEFAULT_LOCATIONS.iter().map(|s| s.to_string()).collect(),
            country: DEFAULT_COUNTRY.to_string(),
            forecast_days: DEFAULT_FORECAST_DAYS,
            request_delay_ms: 500,
            request_timeout_secs: 30,
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: default_output_dir(),
            table_format: TableFormat::default(),
        }
    }
}

impl RunConfig {
    /// Loads and validates a TOML configuration file.
    ///
    /// # Arguments
    ///
    /// * `path` - path to the configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml = fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: RunConfig =
            toml::from_str(&toml).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by `WEATHER_COLLECTOR_CONFIG`, or the defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locations.is_empty() {
            return Err(ConfigError::Invalid("no locations configured".to_string()));
        }
        if self.locations.iter().any(|l| l.trim().is_empty()) {
            return Err(ConfigError::Invalid("location names must not be blank".to_string()));
        }
        if !(1..=MAX_FORECAST_DAYS).contains(&self.forecast_days) {
            return Err(ConfigError::Invalid(format!(
                "forecast_days must be between 1 and {}, got {}",
                MAX_FORECAST_DAYS, self.forecast_days
            )));
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Reads the API key from `WEATHER_API_KEY`.
pub fn api_key_from_env() -> Result<String, ConfigError> {
    env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or(ConfigError::MissingApiKey(API_KEY_ENV))
}
