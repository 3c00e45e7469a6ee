use crate::persistence::error::PersistenceError;
use crate::persistence::master_log::MasterLog;
use crate::persistence::snapshot::SnapshotWriter;
use crate::types::forecast_table::ForecastTable;
use crate::types::table_format::TableFormat;
use std::path::{Path, PathBuf};

pub const MASTER_DIR_NAME: &str = "master";
pub const SNAPSHOTS_DIR_NAME: &str = "snapshots";
pub const MASTER_FILE_STEM: &str = "weather_data_master";

/// Where a run's table ends up: the cumulative master log, its exported
/// spreadsheet, and the per-run snapshot directory.
///
/// The two write contracts are independent. Neither reads what the other
/// wrote, and a failure in one does not prevent the other.
#[derive(Debug, Clone)]
pub struct ForecastStore {
    master: MasterLog,
    master_file: PathBuf,
    snapshots: SnapshotWriter,
}

impl ForecastStore {
    pub fn new(master: MasterLog, master_file: PathBuf, snapshots: SnapshotWriter) -> Self {
        Self {
            master,
            master_file,
            snapshots,
        }
    }

    /// Standard layout under one output directory:
    ///
    /// ```text
    /// <output_dir>/master/batch_*.parquet
    /// <output_dir>/weather_data_master.<ext>
    /// <output_dir>/snapshots/weather_snapshot_*.<ext>
    /// ```
    pub fn in_dir(output_dir: &Path, format: TableFormat) -> Self {
        Self::new(
            MasterLog::new(output_dir.join(MASTER_DIR_NAME)),
            output_dir.join(format!("{}.{}", MASTER_FILE_STEM, format.extension())),
            SnapshotWriter::new(output_dir.join(SNAPSHOTS_DIR_NAME), format),
        )
    }

    pub fn master(&self) -> &MasterLog {
        &self.master
    }

    pub fn master_file(&self) -> &Path {
        &self.master_file
    }

    pub fn snapshots(&self) -> &SnapshotWriter {
        &self.snapshots
    }

    /// Adds the run's rows after every previously stored row. Returns the number
    /// of rows added.
    pub async fn append_master(&self, table: &ForecastTable) -> Result<usize, PersistenceError> {
        self.master.append(table).await
    }

    /// Rewrites the master spreadsheet from the full log. Returns its row count.
    pub async fn export_master(&self) -> Result<usize, PersistenceError> {
        self.master
            .export(&self.master_file, self.snapshots.format())
            .await
    }

    pub async fn load_master(&self) -> Result<ForecastTable, PersistenceError> {
        self.master.load().await
    }

    pub async fn write_snapshot(&self, table: &ForecastTable) -> Result<PathBuf, PersistenceError> {
        self.snapshots.write(table).await
    }
}
