mod config;
mod error;
mod forecast_api;
mod normalize;
mod persistence;
mod pipeline;
mod summary;
mod types;
mod utils;

#[cfg(test)]
mod test_support;

pub use config::{api_key_from_env, ConfigError, RunConfig, API_KEY_ENV, CONFIG_PATH_ENV};
pub use error::{CollectorError, LocationError};
pub use pipeline::{LocationOutcome, PersistenceReport, Pipeline, RunReport};

pub use forecast_api::client::*;
pub use forecast_api::error::FetchError;

pub use normalize::error::NormalizeError;
pub use normalize::normalizer::{km_to_m, kph_to_mps, Normalizer};

pub use persistence::error::PersistenceError;
pub use persistence::master_log::MasterLog;
pub use persistence::snapshot::SnapshotWriter;
pub use persistence::store::*;
pub use persistence::table_io::read_table;

pub use summary::*;

pub use types::forecast_record::{record_schema, ForecastRecord, DATE_FORMAT, TIMESTAMP_FORMAT};
pub use types::forecast_table::{ForecastTable, TableError};
pub use types::table_format::TableFormat;

pub use utils::{capture_snapshot_timestamp, default_output_dir};
