//! One collection run: fetch every configured location, normalize, summarize and persist.

use crate::config::RunConfig;
use crate::error::{CollectorError, LocationError};
use crate::forecast_api::client::ForecastApi;
use crate::normalize::normalizer::Normalizer;
use crate::persistence::error::PersistenceError;
use crate::persistence::store::ForecastStore;
use crate::summary::RunSummary;
use crate::types::forecast_record::ForecastRecord;
use crate::types::forecast_table::ForecastTable;
use crate::utils::capture_snapshot_timestamp;
use bon::bon;
use chrono::{NaiveDate, NaiveDateTime};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;

/// What happened to one location during a run.
#[derive(Debug)]
pub struct LocationOutcome {
    pub location: String,
    /// Number of records contributed, or why the location was skipped.
    pub result: Result<usize, LocationError>,
}

impl LocationOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result of each write contract. The contracts run independently, so any
/// combination of successes and failures is possible.
#[derive(Debug)]
pub struct PersistenceReport {
    /// Rows added to the master log. `Ok(0)` when this exact table was already appended.
    pub master_append: Result<usize, PersistenceError>,
    /// Total rows in the exported master file.
    pub master_export: Result<usize, PersistenceError>,
    pub snapshot: Result<PathBuf, PersistenceError>,
}

impl PersistenceReport {
    pub fn is_complete(&self) -> bool {
        self.master_append.is_ok() && self.master_export.is_ok() && self.snapshot.is_ok()
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub snapshot_timestamp: NaiveDateTime,
    /// One entry per configured location, in collection order.
    pub outcomes: Vec<LocationOutcome>,
    pub table: ForecastTable,
    pub summary: RunSummary,
    pub persistence: PersistenceReport,
}

impl RunReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &LocationOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &LocationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    api: ForecastApi,
    store: ForecastStore,
    locations: Vec<String>,
    request_delay: Duration,
    as_of: Option<NaiveDate>,
}

#[bon]
impl Pipeline {
    /// Creates a new `Pipeline`.
    ///
    /// # Arguments
    ///
    /// * `.api(ForecastApi)`: **Required.** Client used for every location.
    /// * `.store(ForecastStore)`: **Required.** Destination of the run's table.
    /// * `.locations(Vec<String>)`: **Required.** Locations in collection order.
    /// * `.request_delay(Duration)`: Optional. Pause between consecutive requests. Defaults to 500 ms.
    /// * `.as_of(NaiveDate)`: Optional. Fixed reference date for `days_ahead`. By default the
    ///   local date is read once per location, when its response is normalized.
    #[builder]
    pub fn new(
        api: ForecastApi,
        store: ForecastStore,
        locations: Vec<String>,
        request_delay: Option<Duration>,
        as_of: Option<NaiveDate>,
    ) -> Self {
        Self {
            api,
            store,
            locations,
            request_delay: request_delay.unwrap_or(Duration::from_millis(500)),
            as_of,
        }
    }

    /// Builds a pipeline from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Config`] if the configuration is invalid and
    /// [`CollectorError::Fetch`] if the HTTP client cannot be created.
    pub fn from_config(config: &RunConfig, api_key: String) -> Result<Self, CollectorError> {
        config.validate()?;
        let api = ForecastApi::builder()
            .api_key(api_key)
            .base_url(config.base_url.clone())
            .country(config.country.clone())
            .days(config.forecast_days)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self::builder()
            .api(api)
            .store(ForecastStore::in_dir(&config.output_dir, config.table_format))
            .locations(config.locations.clone())
            .request_delay(config.request_delay())
            .build())
    }

    pub fn store(&self) -> &ForecastStore {
        &self.store
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Fetches and normalizes every location in order.
    ///
    /// Locations are requested one at a time with `request_delay` between
    /// consecutive requests. A failing location is logged and skipped; it never
    /// aborts the run.
    ///
    /// # Returns
    ///
    /// The combined table, with each location's rows contiguous and in
    /// configuration order, and one [`LocationOutcome`] per location.
    pub async fn collect(
        &self,
        snapshot_timestamp: NaiveDateTime,
    ) -> (ForecastTable, Vec<LocationOutcome>) {
        let normalizer = Normalizer::new(snapshot_timestamp);
        let total = self.locations.len();
        let mut table = ForecastTable::new();
        let mut outcomes = Vec::with_capacity(total);

        for (i, location) in self.locations.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                sleep(self.request_delay).await;
            }
            info!("[{}/{}] Fetching forecast for {}", i + 1, total, location);

            let result = match self.collect_location(&normalizer, location).await {
                Ok(records) => {
                    let count = records.len();
                    info!("Got {} forecast day(s) for {}", count, location);
                    table.extend_location(records);
                    Ok(count)
                }
                Err(e) => {
                    warn!("Skipping {}: {}", location, e);
                    Err(e)
                }
            };
            outcomes.push(LocationOutcome {
                location: location.clone(),
                result,
            });
        }

        (table, outcomes)
    }

    async fn collect_location(
        &self,
        normalizer: &Normalizer,
        location: &str,
    ) -> Result<Vec<ForecastRecord>, LocationError> {
        let raw = self.api.fetch(location).await?;
        let records = match self.as_of {
            Some(as_of) => normalizer.normalize_as_of(&raw, location, as_of)?,
            // The local date is read once here and drives both is_today and days_ahead.
            None => normalizer.normalize(&raw, location)?,
        };
        Ok(records)
    }

    /// Runs both write contracts for a non-empty table.
    ///
    /// The master log is appended and re-exported, and a snapshot file is
    /// written. Failures are logged and reported, never propagated, so one
    /// failing contract does not prevent the other.
    pub async fn persist(&self, table: &ForecastTable) -> PersistenceReport {
        let master_append = self.store.append_master(table).await;
        match &master_append {
            Ok(rows) => info!("Appended {} row(s) to {}", rows, self.store.master().dir().display()),
            Err(e) => error!("Failed to append to master log: {}", e),
        }

        let master_export = self.store.export_master().await;
        match &master_export {
            Ok(rows) => info!(
                "Exported {} row(s) to {}",
                rows,
                self.store.master_file().display()
            ),
            Err(e) => error!("Failed to export master file: {}", e),
        }

        let snapshot = self.store.write_snapshot(table).await;
        match &snapshot {
            Ok(path) => info!("Wrote snapshot {}", path.display()),
            Err(e) => error!("Failed to write snapshot: {}", e),
        }

        PersistenceReport {
            master_append,
            master_export,
            snapshot,
        }
    }

    /// Runs the whole pipeline using the current local time as snapshot timestamp.
    pub async fn run(&self) -> Result<RunReport, CollectorError> {
        self.run_at(capture_snapshot_timestamp()).await
    }

    /// Runs the whole pipeline for a fixed snapshot timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::NoRecords`] when no location produced any
    /// record. Nothing is written in that case.
    pub async fn run_at(
        &self,
        snapshot_timestamp: NaiveDateTime,
    ) -> Result<RunReport, CollectorError> {
        info!(
            "Collecting {} location(s), snapshot {}",
            self.locations.len(),
            snapshot_timestamp
        );

        let (table, outcomes) = self.collect(snapshot_timestamp).await;
        if table.is_empty() {
            error!("No forecast records collected; nothing written");
            return Err(CollectorError::NoRecords {
                attempted: outcomes.len(),
            });
        }

        let summary = RunSummary::from_table(&table);
        let persistence = self.persist(&table).await;

        Ok(RunReport {
            snapshot_timestamp,
            outcomes,
            table,
            summary,
            persistence,
        })
    }
}
