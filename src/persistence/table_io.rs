//! Blocking helpers that move whole tables between `DataFrame`s and files.
//!
//! Files are always written to a temporary file in the destination directory
//! first and then renamed into place, so readers never see a half-written table.

use crate::persistence::error::PersistenceError;
use crate::types::forecast_record::record_schema;
use crate::types::forecast_table::ForecastTable;
use crate::types::table_format::TableFormat;
use polars::prelude::*;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// Fail with [`PersistenceError::AlreadyExists`] if the destination exists.
    CreateNew,
    /// Replace the destination in full.
    Replace,
}

pub(crate) fn write_table_file(
    mut df: DataFrame,
    path: &Path,
    format: TableFormat,
    mode: WriteMode,
) -> Result<(), PersistenceError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp_file =
        NamedTempFile::new_in(dir).map_err(|e| PersistenceError::WriteIo(path.to_path_buf(), e))?;

    match format {
        TableFormat::Csv => CsvWriter::new(temp_file.as_file_mut())
            .include_header(true)
            .finish(&mut df),
        TableFormat::Parquet => ParquetWriter::new(temp_file.as_file_mut())
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map(|_| ()),
    }
    .map_err(|e| PersistenceError::WritePolars(path.to_path_buf(), e))?;

    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| PersistenceError::WriteIo(path.to_path_buf(), e))?;

    match mode {
        WriteMode::CreateNew => temp_file.persist_noclobber(path).map_err(|e| {
            if e.error.kind() == ErrorKind::AlreadyExists {
                PersistenceError::AlreadyExists(path.to_path_buf())
            } else {
                PersistenceError::WriteIo(path.to_path_buf(), e.error)
            }
        })?,
        WriteMode::Replace => temp_file
            .persist(path)
            .map_err(|e| PersistenceError::WriteIo(path.to_path_buf(), e.error))?,
    };

    Ok(())
}

pub(crate) fn read_table_file(path: &Path, format: TableFormat) -> Result<DataFrame, PersistenceError> {
    match format {
        TableFormat::Csv => CsvReadOptions::default()
            .with_has_header(true)
            .with_schema(Some(Arc::new(record_schema())))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish()),
        TableFormat::Parquet => {
            let file =
                File::open(path).map_err(|e| PersistenceError::ReadIo(path.to_path_buf(), e))?;
            ParquetReader::new(file).finish()
        }
    }
    .map_err(|e| PersistenceError::ReadPolars(path.to_path_buf(), e))
}

/// Reads a snapshot or exported master file back into a [`ForecastTable`].
///
/// CSV files are read with the fixed record schema rather than inferred types.
///
/// # Errors
///
/// Returns [`PersistenceError::ReadIo`] / [`PersistenceError::ReadPolars`] if the
/// file cannot be opened or decoded, and [`PersistenceError::Table`] if its
/// columns do not match the record layout.
pub async fn read_table(path: &Path, format: TableFormat) -> Result<ForecastTable, PersistenceError> {
    let path_buf = path.to_path_buf();
    let df = tokio::task::spawn_blocking(move || read_table_file(&path_buf, format)).await??;
    Ok(ForecastTable::from_dataframe(&df)?)
}
