use crate::config::ConfigError;
use crate::forecast_api::error::FetchError;
use crate::normalize::error::NormalizeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No forecast records collected from {attempted} location(s)")]
    NoRecords { attempted: usize },
}

/// Why one location contributed no records to a run.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}
