//! The run-scoped table of forecast records and its conversion to and from
//! a Polars `DataFrame`.

use crate::types::forecast_record::{ForecastRecord, DATE_FORMAT, TIMESTAMP_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Required column '{0}' not found in DataFrame")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Column '{column}' does not have the expected type")]
    ColumnType {
        column: String,
        #[source]
        source: PolarsError,
    },

    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Failed building DataFrame: {0}")]
    DataFrame(#[from] PolarsError),
}

/// Ordered forecast records for one run.
///
/// Insertion order is location order, then forecast-day order within a
/// location. There is no uniqueness constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastTable {
    records: Vec<ForecastRecord>,
}

impl ForecastTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one location's records after everything already in the table.
    pub fn extend_location(&mut self, records: Vec<ForecastRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[ForecastRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The capture instant of the run, taken from the first record.
    pub fn snapshot_timestamp(&self) -> Option<NaiveDateTime> {
        self.records.first().map(|r| r.snapshot_timestamp)
    }

    /// Builds a `DataFrame` with one row per record and the fixed column order
    /// of [`crate::types::forecast_record::COLUMNS`].
    pub fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        let records = &self.records;

        macro_rules! column {
            ($name:expr, $value:expr) => {
                Column::new($name.into(), records.iter().map($value).collect::<Vec<_>>())
            };
        }

        let df = DataFrame::new(vec![
            column!("snapshot_timestamp", |r: &ForecastRecord| r
                .snapshot_timestamp
                .format(TIMESTAMP_FORMAT)
                .to_string()),
            column!("location_name", |r: &ForecastRecord| r.location_name.clone()),
            column!("forecast_date", |r: &ForecastRecord| r
                .forecast_date
                .format(DATE_FORMAT)
                .to_string()),
            column!("days_ahead", |r: &ForecastRecord| r.days_ahead),
            column!("latitude", |r: &ForecastRecord| r.latitude),
            column!("longitude", |r: &ForecastRecord| r.longitude),
            column!("temperature", |r: &ForecastRecord| r.temperature),
            column!("feels_like", |r: &ForecastRecord| r.feels_like),
            column!("temp_min", |r: &ForecastRecord| r.temp_min),
            column!("temp_max", |r: &ForecastRecord| r.temp_max),
            column!("avg_temp", |r: &ForecastRecord| r.avg_temp),
            column!("weather_condition", |r: &ForecastRecord| r.weather_condition.clone()),
            column!("weather_description", |r: &ForecastRecord| r.weather_description.clone()),
            column!("pressure", |r: &ForecastRecord| r.pressure),
            column!("humidity", |r: &ForecastRecord| r.humidity),
            column!("avg_humidity", |r: &ForecastRecord| r.avg_humidity),
            column!("wind_speed", |r: &ForecastRecord| r.wind_speed),
            column!("wind_direction", |r: &ForecastRecord| r.wind_direction),
            column!("max_wind_kph", |r: &ForecastRecord| r.max_wind_kph),
            column!("cloudiness", |r: &ForecastRecord| r.cloudiness),
            column!("visibility", |r: &ForecastRecord| r.visibility),
            column!("avg_visibility_km", |r: &ForecastRecord| r.avg_visibility_km),
            column!("precip_mm", |r: &ForecastRecord| r.precip_mm),
            column!("total_precip_mm", |r: &ForecastRecord| r.total_precip_mm),
            column!("total_snow_cm", |r: &ForecastRecord| r.total_snow_cm),
            column!("uv_index", |r: &ForecastRecord| r.uv_index),
            column!("daily_will_it_rain", |r: &ForecastRecord| r.daily_will_it_rain),
            column!("daily_chance_of_rain", |r: &ForecastRecord| r.daily_chance_of_rain),
            column!("daily_will_it_snow", |r: &ForecastRecord| r.daily_will_it_snow),
            column!("daily_chance_of_snow", |r: &ForecastRecord| r.daily_chance_of_snow),
            column!("sunrise", |r: &ForecastRecord| r.sunrise.clone()),
            column!("sunset", |r: &ForecastRecord| r.sunset.clone()),
            column!("moonrise", |r: &ForecastRecord| r.moonrise.clone()),
            column!("moonset", |r: &ForecastRecord| r.moonset.clone()),
            column!("moon_phase", |r: &ForecastRecord| r.moon_phase.clone()),
            column!("moon_illumination", |r: &ForecastRecord| r.moon_illumination),
        ])?;

        Ok(df)
    }

    /// Reads records back out of a `DataFrame` laid out like [`Self::to_dataframe`].
    ///
    /// Text columns tolerate nulls (CSV readers turn empty cells into nulls) and
    /// yield an empty string. Numeric columns that are non-nullable in
    /// [`ForecastRecord`] must hold a value in every row.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ColumnNotFound`] or [`TableError::ColumnType`] when the
    /// layout does not match, [`TableError::MissingValue`] for a null in a
    /// required column and [`TableError::InvalidValue`] for unparseable dates.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, TableError> {
        let snapshot_timestamp = text_column(df, "snapshot_timestamp")?;
        let location_name = text_column(df, "location_name")?;
        let forecast_date = text_column(df, "forecast_date")?;
        let days_ahead = int_column(df, "days_ahead")?;
        let latitude = float_column(df, "latitude")?;
        let longitude = float_column(df, "longitude")?;
        let temperature = float_column(df, "temperature")?;
        let feels_like = float_column(df, "feels_like")?;
        let temp_min = float_column(df, "temp_min")?;
        let temp_max = float_column(df, "temp_max")?;
        let avg_temp = float_column(df, "avg_temp")?;
        let weather_condition = text_column(df, "weather_condition")?;
        let weather_description = text_column(df, "weather_description")?;
        let pressure = float_column(df, "pressure")?;
        let humidity = float_column(df, "humidity")?;
        let avg_humidity = float_column(df, "avg_humidity")?;
        let wind_speed = float_column(df, "wind_speed")?;
        let wind_direction = int_column(df, "wind_direction")?;
        let max_wind_kph = float_column(df, "max_wind_kph")?;
        let cloudiness = int_column(df, "cloudiness")?;
        let visibility = float_column(df, "visibility")?;
        let avg_visibility_km = float_column(df, "avg_visibility_km")?;
        let precip_mm = float_column(df, "precip_mm")?;
        let total_precip_mm = float_column(df, "total_precip_mm")?;
        let total_snow_cm = float_column(df, "total_snow_cm")?;
        let uv_index = float_column(df, "uv_index")?;
        let will_it_rain = int_column(df, "daily_will_it_rain")?;
        let chance_of_rain = int_column(df, "daily_chance_of_rain")?;
        let will_it_snow = int_column(df, "daily_will_it_snow")?;
        let chance_of_snow = int_column(df, "daily_chance_of_snow")?;
        let sunrise = text_column(df, "sunrise")?;
        let sunset = text_column(df, "sunset")?;
        let moonrise = text_column(df, "moonrise")?;
        let moonset = text_column(df, "moonset")?;
        let moon_phase = text_column(df, "moon_phase")?;
        let moon_illumination = int_column(df, "moon_illumination")?;

        let text = |ca: &StringChunked, row: usize| ca.get(row).unwrap_or_default().to_string();

        let mut records = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let raw_timestamp = text(snapshot_timestamp, row);
            let raw_date = text(forecast_date, row);

            records.push(ForecastRecord {
                snapshot_timestamp: NaiveDateTime::parse_from_str(&raw_timestamp, TIMESTAMP_FORMAT)
                    .map_err(|_| TableError::InvalidValue {
                        column: "snapshot_timestamp".to_string(),
                        row,
                        value: raw_timestamp.clone(),
                    })?,
                location_name: text(location_name, row),
                forecast_date: NaiveDate::parse_from_str(&raw_date, DATE_FORMAT).map_err(
                    |_| TableError::InvalidValue {
                        column: "forecast_date".to_string(),
                        row,
                        value: raw_date.clone(),
                    },
                )?,
                days_ahead: required(days_ahead.get(row), "days_ahead", row)?,
                latitude: required(latitude.get(row), "latitude", row)?,
                longitude: required(longitude.get(row), "longitude", row)?,
                temperature: required(temperature.get(row), "temperature", row)?,
                feels_like: feels_like.get(row),
                temp_min: required(temp_min.get(row), "temp_min", row)?,
                temp_max: required(temp_max.get(row), "temp_max", row)?,
                avg_temp: required(avg_temp.get(row), "avg_temp", row)?,
                weather_condition: text(weather_condition, row),
                weather_description: text(weather_description, row),
                pressure: pressure.get(row),
                humidity: required(humidity.get(row), "humidity", row)?,
                avg_humidity: required(avg_humidity.get(row), "avg_humidity", row)?,
                wind_speed: required(wind_speed.get(row), "wind_speed", row)?,
                wind_direction: wind_direction.get(row),
                max_wind_kph: required(max_wind_kph.get(row), "max_wind_kph", row)?,
                cloudiness: cloudiness.get(row),
                visibility: required(visibility.get(row), "visibility", row)?,
                avg_visibility_km: required(avg_visibility_km.get(row), "avg_visibility_km", row)?,
                precip_mm: required(precip_mm.get(row), "precip_mm", row)?,
                total_precip_mm: required(total_precip_mm.get(row), "total_precip_mm", row)?,
                total_snow_cm: required(total_snow_cm.get(row), "total_snow_cm", row)?,
                uv_index: uv_index.get(row),
                daily_will_it_rain: required(will_it_rain.get(row), "daily_will_it_rain", row)?,
                daily_chance_of_rain: required(
                    chance_of_rain.get(row),
                    "daily_chance_of_rain",
                    row,
                )?,
                daily_will_it_snow: required(will_it_snow.get(row), "daily_will_it_snow", row)?,
                daily_chance_of_snow: required(
                    chance_of_snow.get(row),
                    "daily_chance_of_snow",
                    row,
                )?,
                sunrise: text(sunrise, row),
                sunset: text(sunset, row),
                moonrise: text(moonrise, row),
                moonset: text(moonset, row),
                moon_phase: text(moon_phase, row),
                moon_illumination: required(
                    moon_illumination.get(row),
                    "moon_illumination",
                    row,
                )?,
            });
        }

        Ok(Self { records })
    }
}

impl From<Vec<ForecastRecord>> for ForecastTable {
    fn from(records: Vec<ForecastRecord>) -> Self {
        Self { records }
    }
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, TableError> {
    df.column(name)
        .map_err(|e| TableError::ColumnNotFound(name.to_string(), e))
}

fn float_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Float64Chunked, TableError> {
    column(df, name)?.f64().map_err(|e| TableError::ColumnType {
        column: name.to_string(),
        source: e,
    })
}

fn int_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Int64Chunked, TableError> {
    column(df, name)?.i64().map_err(|e| TableError::ColumnType {
        column: name.to_string(),
        source: e,
    })
}

fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked, TableError> {
    column(df, name)?.str().map_err(|e| TableError::ColumnType {
        column: name.to_string(),
        source: e,
    })
}

fn required<T>(value: Option<T>, column: &str, row: usize) -> Result<T, TableError> {
    value.ok_or_else(|| TableError::MissingValue {
        column: column.to_string(),
        row,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_record, snapshot_at};
    use crate::types::forecast_record::COLUMNS;

    #[test]
    fn test_to_dataframe_column_layout() -> Result<(), Box<dyn std::error::Error>> {
        let snapshot = snapshot_at(2025, 3, 14, 9, 30, 0);
        let table = ForecastTable::from(vec![
            sample_record("Leeds", snapshot, 0),
            sample_record("Leeds", snapshot, 1),
        ]);

        let df = table.to_dataframe()?;
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), COLUMNS.len());

        for (i, (name, dtype)) in COLUMNS.iter().enumerate() {
            let column = &df.get_columns()[i];
            assert_eq!(column.name().as_str(), *name);
            assert_eq!(column.dtype(), dtype, "column '{}' has wrong type", name);
        }

        let dates = df.column("forecast_date")?.str()?;
        assert_eq!(dates.get(0), Some("2025-03-14"));
        assert_eq!(dates.get(1), Some("2025-03-15"));
        Ok(())
    }

    #[test]
    fn test_dataframe_round_trip_preserves_nulls() -> Result<(), Box<dyn std::error::Error>> {
        let snapshot = snapshot_at(2025, 3, 14, 9, 30, 0);
        let today = sample_record("York", snapshot, 0);
        let tomorrow = sample_record("York", snapshot, 1);
        assert!(today.pressure.is_some());
        assert!(tomorrow.pressure.is_none());

        let table = ForecastTable::from(vec![today, tomorrow]);
        let restored = ForecastTable::from_dataframe(&table.to_dataframe()?)?;

        assert_eq!(restored, table);
        Ok(())
    }

    #[test]
    fn test_empty_table_keeps_schema() -> Result<(), Box<dyn std::error::Error>> {
        let df = ForecastTable::new().to_dataframe()?;
        assert_eq!(df.height(), 0);
        assert_eq!(df.column("feels_like")?.dtype(), &DataType::Float64);
        assert!(ForecastTable::from_dataframe(&df)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_from_dataframe_reports_missing_column() -> Result<(), Box<dyn std::error::Error>> {
        let snapshot = snapshot_at(2025, 3, 14, 9, 30, 0);
        let table = ForecastTable::from(vec![sample_record("Bath", snapshot, 0)]);
        let df = table.to_dataframe()?.drop("temperature")?;

        match ForecastTable::from_dataframe(&df) {
            Err(TableError::ColumnNotFound(name, _)) => assert_eq!(name, "temperature"),
            other => panic!("expected ColumnNotFound, got {:?}", other),
        }
        Ok(())
    }
}
