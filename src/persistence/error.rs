use crate::types::forecast_table::TableError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to create directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to list directory '{0}'")]
    DirRead(PathBuf, #[source] std::io::Error),

    #[error("Cannot persist an empty table")]
    EmptyTable,

    #[error("Refusing to overwrite existing file '{0}'")]
    AlreadyExists(PathBuf),

    // Errors during table writing (inside blocking task)
    #[error("I/O error writing table file '{0}'")]
    WriteIo(PathBuf, #[source] std::io::Error),
    #[error("Encoding error writing table file '{0}'")]
    WritePolars(PathBuf, #[source] PolarsError),

    #[error("I/O error reading table file '{0}'")]
    ReadIo(PathBuf, #[source] std::io::Error),
    #[error("Failed to read table file '{0}'")]
    ReadPolars(PathBuf, #[source] PolarsError),

    #[error("Failed to query master log in '{0}'")]
    Query(PathBuf, #[source] PolarsError),

    #[error("Table layout mismatch")]
    Table(#[from] TableError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
