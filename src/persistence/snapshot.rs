use crate::persistence::error::PersistenceError;
use crate::persistence::table_io::{write_table_file, WriteMode};
use crate::types::forecast_table::ForecastTable;
use crate::types::table_format::TableFormat;
use chrono::NaiveDateTime;
use log::info;
use std::path::{Path, PathBuf};
use tokio::{fs, task};

const SNAPSHOT_PREFIX: &str = "weather_snapshot_";
const SNAPSHOT_KEY_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Writes one immutable file per run into a snapshots directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    format: TableFormat,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>, format: TableFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    /// File name for a snapshot captured at `snapshot_timestamp`, e.g.
    /// `weather_snapshot_20250314_093000.csv`.
    pub fn snapshot_path(&self, snapshot_timestamp: NaiveDateTime) -> PathBuf {
        self.dir.join(format!(
            "{}{}.{}",
            SNAPSHOT_PREFIX,
            snapshot_timestamp.format(SNAPSHOT_KEY_FORMAT),
            self.format.extension()
        ))
    }

    /// Writes `table` to a new snapshot file and returns its path.
    ///
    /// Existing snapshots are never read or modified.
    ///
    /// # Errors
    ///
    /// * [`PersistenceError::EmptyTable`] if `table` has no records (the file
    ///   name is derived from the records' snapshot timestamp).
    /// * [`PersistenceError::AlreadyExists`] if a snapshot with the same
    ///   second-resolution timestamp was already written.
    /// * Directory or write errors otherwise.
    pub async fn write(&self, table: &ForecastTable) -> Result<PathBuf, PersistenceError> {
        let snapshot_timestamp = table
            .snapshot_timestamp()
            .ok_or(PersistenceError::EmptyTable)?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PersistenceError::DirCreation(self.dir.clone(), e))?;

        let path = self.snapshot_path(snapshot_timestamp);
        let df = table.to_dataframe()?;
        let format = self.format;
        let path_clone = path.clone();
        task::spawn_blocking(move || write_table_file(df, &path_clone, format, WriteMode::CreateNew))
            .await??;

        info!("Snapshot saved: {:?}", path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::table_io::read_table;
    use crate::test_support::{sample_record, snapshot_at};

    fn table_at(snapshot: NaiveDateTime, location: &str) -> ForecastTable {
        ForecastTable::from(
            (0..3)
                .map(|d| sample_record(location, snapshot, d))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_sequential_runs_produce_distinct_snapshots() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let writer = SnapshotWriter::new(dir.path().join("snapshots"), TableFormat::Parquet);

        let first = table_at(snapshot_at(2025, 3, 14, 9, 30, 0), "Leeds");
        let first_path = writer.write(&first).await?;
        let first_bytes = std::fs::read(&first_path)?;

        let second = table_at(snapshot_at(2025, 3, 14, 9, 30, 1), "York");
        let second_path = writer.write(&second).await?;

        assert_ne!(first_path, second_path);
        assert_eq!(std::fs::read(&first_path)?, first_bytes);
        assert_eq!(read_table(&first_path, TableFormat::Parquet).await?, first);
        assert_eq!(read_table(&second_path, TableFormat::Parquet).await?, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_never_overwrites() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let writer = SnapshotWriter::new(dir.path(), TableFormat::Csv);
        let snapshot = snapshot_at(2025, 3, 14, 9, 30, 0);

        let path = writer.write(&table_at(snapshot, "Leeds")).await?;
        let original = std::fs::read(&path)?;

        let result = writer.write(&table_at(snapshot, "Glasgow")).await;
        assert!(matches!(result, Err(PersistenceError::AlreadyExists(ref p)) if *p == path));
        assert_eq!(std::fs::read(&path)?, original);
        Ok(())
    }

    #[tokio::test]
    async fn test_csv_snapshot_reads_back() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let writer = SnapshotWriter::new(dir.path(), TableFormat::Csv);
        let table = table_at(snapshot_at(2025, 3, 14, 9, 30, 0), "Edinburgh");

        let path = writer.write(&table).await?;
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("weather_snapshot_20250314_093000.csv")
        );

        let restored = read_table(&path, TableFormat::Csv).await?;
        assert_eq!(restored.len(), 3);
        let offsets: Vec<i64> = restored.records().iter().map(|r| r.days_ahead).collect();
        assert_eq!(offsets, vec![0, 1, 2]);
        assert!(restored.records()[1].pressure.is_none());
        assert_eq!(restored.records()[0].wind_direction, Some(230));
        assert_eq!(restored.records()[0].location_name, "Edinburgh");
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path(), TableFormat::Csv);
        let result = writer.write(&ForecastTable::new()).await;
        assert!(matches!(result, Err(PersistenceError::EmptyTable)));
    }
}
