use crate::persistence::error::PersistenceError;
use crate::persistence::table_io::{read_table_file, write_table_file, WriteMode};
use crate::types::forecast_record::record_schema;
use crate::types::forecast_table::ForecastTable;
use crate::types::table_format::TableFormat;
use chrono::NaiveDateTime;
use log::{debug, info};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::{fs, task};

const BATCH_PREFIX: &str = "batch_";
const BATCH_EXTENSION: &str = "parquet";
const BATCH_KEY_FORMAT: &str = "%Y%m%dT%H%M%S";
// Distinct runs captured within the same second.
const MAX_BATCHES_PER_KEY: u32 = 1000;

/// Durable history of every collected forecast record.
///
/// The log is a directory of immutable parquet batches, one per run, named
/// after the run's snapshot timestamp. Appending never rewrites earlier
/// batches, so independent runs cannot lose each other's rows. Re-appending a
/// table identical to a stored batch is a no-op; a different table with the
/// same timestamp gets the next free sequence number (`batch_<ts>_001`, ...).
#[derive(Debug, Clone)]
pub struct MasterLog {
    dir: PathBuf,
}

impl MasterLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of batch `sequence` for the runs captured at `snapshot_timestamp`.
    /// Sequence 0 has no suffix.
    pub fn batch_path(&self, snapshot_timestamp: NaiveDateTime, sequence: u32) -> PathBuf {
        let key = snapshot_timestamp.format(BATCH_KEY_FORMAT);
        let name = if sequence == 0 {
            format!("{}{}.{}", BATCH_PREFIX, key, BATCH_EXTENSION)
        } else {
            format!("{}{}_{:03}.{}", BATCH_PREFIX, key, sequence, BATCH_EXTENSION)
        };
        self.dir.join(name)
    }

    /// Appends `table` as a new batch and returns the number of rows added.
    ///
    /// Returns `Ok(0)` for an empty table or when an identical batch for the
    /// same snapshot timestamp is already in the log.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::DirCreation`] if the log directory cannot be
    /// created, [`PersistenceError::AlreadyExists`] if every sequence slot for
    /// the timestamp is taken, or a read/write error for the batch files.
    pub async fn append(&self, table: &ForecastTable) -> Result<usize, PersistenceError> {
        let Some(snapshot_timestamp) = table.snapshot_timestamp() else {
            debug!("Nothing to append to master log, table is empty");
            return Ok(0);
        };

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PersistenceError::DirCreation(self.dir.clone(), e))?;

        let df = table.to_dataframe()?;
        let rows = df.height();
        let log = self.clone();
        let table = table.clone();
        let written = task::spawn_blocking(move || {
            log.write_batch(&df, &table, snapshot_timestamp)
        })
        .await??;

        match written {
            Some(path) => {
                info!("Appended {} records to master log as {:?}", rows, path);
                Ok(rows)
            }
            None => {
                info!(
                    "Master log already holds this run ({}), skipping re-append",
                    snapshot_timestamp
                );
                Ok(0)
            }
        }
    }

    /// Claims the first free sequence slot for the timestamp. Returns `None`
    /// when an occupied slot already holds exactly `table`.
    fn write_batch(
        &self,
        df: &DataFrame,
        table: &ForecastTable,
        snapshot_timestamp: NaiveDateTime,
    ) -> Result<Option<PathBuf>, PersistenceError> {
        let mut last = self.batch_path(snapshot_timestamp, 0);
        for sequence in 0..MAX_BATCHES_PER_KEY {
            let path = self.batch_path(snapshot_timestamp, sequence);
            match write_table_file(df.clone(), &path, TableFormat::Parquet, WriteMode::CreateNew) {
                Ok(()) => return Ok(Some(path)),
                Err(PersistenceError::AlreadyExists(existing)) => {
                    let stored = read_table_file(&existing, TableFormat::Parquet)?;
                    if ForecastTable::from_dataframe(&stored)? == *table {
                        return Ok(None);
                    }
                    debug!("Batch {:?} holds a different run, trying next slot", existing);
                    last = existing;
                }
                Err(e) => return Err(e),
            }
        }
        Err(PersistenceError::AlreadyExists(last))
    }

    /// All batch files in the log, oldest snapshot first.
    pub async fn batch_paths(&self) -> Result<Vec<PathBuf>, PersistenceError> {
        let mut paths = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(paths),
            Err(e) => return Err(PersistenceError::DirRead(self.dir.clone(), e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PersistenceError::DirRead(self.dir.clone(), e))?
        {
            let path = entry.path();
            let is_batch = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    name.starts_with(BATCH_PREFIX) && name.ends_with(&format!(".{}", BATCH_EXTENSION))
                });
            if is_batch {
                paths.push(path);
            }
        }

        // Fixed-width keys sort chronologically by name, and `.` sorts before
        // `_`, so sequence 0 precedes its numbered siblings.
        paths.sort();
        Ok(paths)
    }

    /// Lazy query over the whole log, rows in append order.
    ///
    /// An empty or missing log yields an empty frame with the record schema.
    pub async fn scan(&self) -> Result<LazyFrame, PersistenceError> {
        let paths = self.batch_paths().await?;
        if paths.is_empty() {
            return Ok(DataFrame::empty_with_schema(&record_schema()).lazy());
        }

        let frames = paths
            .iter()
            .map(|path| {
                LazyFrame::scan_parquet(path, Default::default())
                    .map_err(|e| PersistenceError::ReadPolars(path.clone(), e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        concat(frames, UnionArgs::default())
            .map_err(|e| PersistenceError::Query(self.dir.clone(), e))
    }

    /// Collects the whole log into a [`ForecastTable`].
    pub async fn load(&self) -> Result<ForecastTable, PersistenceError> {
        let frame = self.scan().await?;
        let dir = self.dir.clone();
        let df = task::spawn_blocking(move || {
            frame
                .collect()
                .map_err(|e| PersistenceError::Query(dir, e))
        })
        .await??;
        Ok(ForecastTable::from_dataframe(&df)?)
    }

    /// Writes the whole log into one table file at `path`, replacing any
    /// previous export, and returns the number of rows written.
    pub async fn export(&self, path: &Path, format: TableFormat) -> Result<usize, PersistenceError> {
        let frame = self.scan().await?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistenceError::DirCreation(parent.to_path_buf(), e))?;
        }

        let dir = self.dir.clone();
        let path_buf = path.to_path_buf();
        let rows = task::spawn_blocking(move || {
            let df = frame
                .collect()
                .map_err(|e| PersistenceError::Query(dir, e))?;
            let rows = df.height();
            write_table_file(df, &path_buf, format, WriteMode::Replace)?;
            Ok::<usize, PersistenceError>(rows)
        })
        .await??;

        info!("Exported {} master records to {:?}", rows, path);
        Ok(rows)
    }
}
