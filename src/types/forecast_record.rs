use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::{DataType, PlSmallStr, Schema};

/// Text form of `forecast_date` in every persisted table.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Text form of `snapshot_timestamp` in every persisted table (second resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One normalized forecast row for a (location, forecast date) pair.
///
/// Units follow the column names: temperatures in °C, `wind_speed` in m/s,
/// `max_wind_kph` in km/h, `visibility` in meters, `avg_visibility_km` in
/// kilometers, precipitation in mm and snow in cm. Fields that only exist for
/// the current day (`feels_like`, `pressure`, `wind_direction`, `cloudiness`)
/// are `None` on every other day.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    pub snapshot_timestamp: NaiveDateTime,
    pub location_name: String,
    pub forecast_date: NaiveDate,
    pub days_ahead: i64,
    pub latitude: f64,
    pub longitude: f64,

    pub temperature: f64,
    pub feels_like: Option<f64>,
    pub temp_min: f64,
    pub temp_max: f64,
    pub avg_temp: f64,

    pub weather_condition: String,
    pub weather_description: String,

    pub pressure: Option<f64>,
    pub humidity: f64,
    pub avg_humidity: f64,

    pub wind_speed: f64,
    pub wind_direction: Option<i64>,
    pub max_wind_kph: f64,

    pub cloudiness: Option<i64>,
    pub visibility: f64,
    pub avg_visibility_km: f64,

    pub precip_mm: f64,
    pub total_precip_mm: f64,
    pub total_snow_cm: f64,

    pub uv_index: Option<f64>,
    pub daily_will_it_rain: i64,
    pub daily_chance_of_rain: i64,
    pub daily_will_it_snow: i64,
    pub daily_chance_of_snow: i64,

    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
    pub moon_phase: String,
    pub moon_illumination: i64,
}

impl ForecastRecord {
    pub fn is_today(&self) -> bool {
        self.days_ahead == 0
    }
}

/// Column layout of a forecast table, in order.
pub(crate) const COLUMNS: [(&str, DataType); 36] = [
    ("snapshot_timestamp", DataType::String),
    ("location_name", DataType::String),
    ("forecast_date", DataType::String),
    ("days_ahead", DataType::Int64),
    ("latitude", DataType::Float64),
    ("longitude", DataType::Float64),
    ("temperature", DataType::Float64),
    ("feels_like", DataType::Float64),
    ("temp_min", DataType::Float64),
    ("temp_max", DataType::Float64),
    ("avg_temp", DataType::Float64),
    ("weather_condition", DataType::String),
    ("weather_description", DataType::String),
    ("pressure", DataType::Float64),
    ("humidity", DataType::Float64),
    ("avg_humidity", DataType::Float64),
    ("wind_speed", DataType::Float64),
    ("wind_direction", DataType::Int64),
    ("max_wind_kph", DataType::Float64),
    ("cloudiness", DataType::Int64),
    ("visibility", DataType::Float64),
    ("avg_visibility_km", DataType::Float64),
    ("precip_mm", DataType::Float64),
    ("total_precip_mm", DataType::Float64),
    ("total_snow_cm", DataType::Float64),
    ("uv_index", DataType::Float64),
    ("daily_will_it_rain", DataType::Int64),
    ("daily_chance_of_rain", DataType::Int64),
    ("daily_will_it_snow", DataType::Int64),
    ("daily_chance_of_snow", DataType::Int64),
    ("sunrise", DataType::String),
    ("sunset", DataType::String),
    ("moonrise", DataType::String),
    ("moonset", DataType::String),
    ("moon_phase", DataType::String),
    ("moon_illumination", DataType::Int64),
];

/// Polars schema matching [`COLUMNS`]. Used to read CSV tables back without
/// relying on type inference (an all-null column would otherwise come back as text).
pub fn record_schema() -> Schema {
    COLUMNS
        .iter()
        .map(|(name, dtype)| (PlSmallStr::from_str(name), dtype.clone()))
        .collect()
}
