//! Turns one raw forecast document into flat per-day [`ForecastRecord`]s.
//!
//! The forecast for today is described by two sources: the current-conditions
//! block (the present instant) and the day aggregate (the whole calendar day).
//! Later days only have the aggregate. For each attribute the normalizer picks
//! the current-conditions value on today's row and the aggregate value on every
//! other row; attributes with no aggregate counterpart are left empty after today.

use crate::normalize::error::NormalizeError;
use crate::types::forecast_record::{ForecastRecord, DATE_FORMAT};
use crate::types::raw_forecast::{RawCurrent, RawDay, RawForecastDay, RawForecastResponse};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

const KPH_PER_METER_PER_SECOND: f64 = 3.6;
const METERS_PER_KILOMETER: f64 = 1000.0;

/// Converts km/h to m/s.
pub fn kph_to_mps(kph: f64) -> f64 {
    kph / KPH_PER_METER_PER_SECOND
}

/// Converts kilometers to meters.
pub fn km_to_m(km: f64) -> f64 {
    km * METERS_PER_KILOMETER
}

/// Attribute values chosen for one forecast day, before unit conversion.
struct Selected {
    temperature: f64,
    feels_like: Option<f64>,
    condition: String,
    pressure: Option<f64>,
    humidity: f64,
    wind_kph: f64,
    wind_direction: Option<i64>,
    cloudiness: Option<i64>,
    visibility_km: f64,
    precip_mm: f64,
}

impl Selected {
    fn from_current(current: &RawCurrent, location: &str) -> Result<Self, NormalizeError> {
        let require = |value: Option<f64>, key: &'static str| {
            value.ok_or_else(|| NormalizeError::MissingKey {
                location: location.to_string(),
                key,
            })
        };
        let condition = current
            .condition
            .as_ref()
            .map(|c| c.text.clone())
            .ok_or_else(|| NormalizeError::MissingKey {
                location: location.to_string(),
                key: "current.condition.text",
            })?;
        let wind_direction = current.wind_degree.ok_or_else(|| NormalizeError::MissingKey {
            location: location.to_string(),
            key: "current.wind_degree",
        })?;
        let cloudiness = current.cloud.ok_or_else(|| NormalizeError::MissingKey {
            location: location.to_string(),
            key: "current.cloud",
        })?;

        Ok(Self {
            temperature: require(current.temp_c, "current.temp_c")?,
            feels_like: Some(require(current.feelslike_c, "current.feelslike_c")?),
            condition,
            pressure: Some(require(current.pressure_mb, "current.pressure_mb")?),
            humidity: require(current.humidity, "current.humidity")?,
            wind_kph: require(current.wind_kph, "current.wind_kph")?,
            wind_direction: Some(wind_direction),
            cloudiness: Some(cloudiness),
            visibility_km: require(current.vis_km, "current.vis_km")?,
            precip_mm: current.precip_mm.unwrap_or(0.0),
        })
    }

    fn from_day(day: &RawDay) -> Self {
        Self {
            temperature: day.avgtemp_c,
            feels_like: None,
            condition: day.condition.text.clone(),
            pressure: None,
            humidity: day.avghumidity,
            wind_kph: day.maxwind_kph,
            wind_direction: None,
            cloudiness: None,
            visibility_km: day.avgvis_km,
            precip_mm: day.totalprecip_mm,
        }
    }
}

/// Normalizes raw forecast documents for one run.
///
/// Every record produced by the same `Normalizer` carries the same
/// `snapshot_timestamp`.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    snapshot_timestamp: NaiveDateTime,
}

impl Normalizer {
    pub fn new(snapshot_timestamp: NaiveDateTime) -> Self {
        Self { snapshot_timestamp }
    }

    pub fn snapshot_timestamp(&self) -> NaiveDateTime {
        self.snapshot_timestamp
    }

    /// Normalizes `raw` using the local calendar date, read once, as the as-of date.
    ///
    /// See [`Normalizer::normalize_as_of`].
    pub fn normalize(
        &self,
        raw: &Value,
        location: &str,
    ) -> Result<Vec<ForecastRecord>, NormalizeError> {
        self.normalize_as_of(raw, location, Local::now().date_naive())
    }

    /// Maps every forecast day in `raw` to one [`ForecastRecord`], in response order.
    ///
    /// `as_of` is the single reference date for the whole location: a day is
    /// "today" exactly when its date equals `as_of`, and `days_ahead` is the
    /// calendar-day difference from `as_of`. Days before `as_of` (a timezone
    /// mismatch upstream) get a negative `days_ahead` and are treated like any
    /// other non-today day.
    ///
    /// # Errors
    ///
    /// Any missing required key aborts the whole location:
    /// * [`NormalizeError::Shape`] when `location`, `current` or `forecast` (or a
    ///   required day/astro key) is absent or mistyped.
    /// * [`NormalizeError::MissingKey`] when today's row needs a current-conditions
    ///   field that is absent.
    /// * [`NormalizeError::InvalidDate`] when a forecast day's date does not parse.
    pub fn normalize_as_of(
        &self,
        raw: &Value,
        location: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<ForecastRecord>, NormalizeError> {
        let response =
            RawForecastResponse::deserialize(raw).map_err(|e| NormalizeError::Shape {
                location: location.to_string(),
                source: e,
            })?;

        response
            .forecast
            .forecastday
            .iter()
            .map(|day| self.normalize_day(&response, day, location, as_of))
            .collect()
    }

    fn normalize_day(
        &self,
        response: &RawForecastResponse,
        forecast_day: &RawForecastDay,
        location: &str,
        as_of: NaiveDate,
    ) -> Result<ForecastRecord, NormalizeError> {
        let forecast_date = NaiveDate::parse_from_str(&forecast_day.date, DATE_FORMAT).map_err(
            |e| NormalizeError::InvalidDate {
                location: location.to_string(),
                value: forecast_day.date.clone(),
                source: e,
            },
        )?;
        let days_ahead = (forecast_date - as_of).num_days();

        let day = &forecast_day.day;
        let astro = &forecast_day.astro;
        let selected = if days_ahead == 0 {
            Selected::from_current(&response.current, location)?
        } else {
            Selected::from_day(day)
        };

        Ok(ForecastRecord {
            snapshot_timestamp: self.snapshot_timestamp,
            location_name: location.to_string(),
            forecast_date,
            days_ahead,
            latitude: response.location.lat,
            longitude: response.location.lon,

            temperature: selected.temperature,
            feels_like: selected.feels_like,
            temp_min: day.mintemp_c,
            temp_max: day.maxtemp_c,
            avg_temp: day.avgtemp_c,

            weather_description: selected.condition.clone(),
            weather_condition: selected.condition,

            pressure: selected.pressure,
            humidity: selected.humidity,
            avg_humidity: day.avghumidity,

            wind_speed: kph_to_mps(selected.wind_kph),
            wind_direction: selected.wind_direction,
            max_wind_kph: day.maxwind_kph,

            cloudiness: selected.cloudiness,
            visibility: km_to_m(selected.visibility_km),
            avg_visibility_km: day.avgvis_km,

            precip_mm: selected.precip_mm,
            total_precip_mm: day.totalprecip_mm,
            total_snow_cm: day.totalsnow_cm.unwrap_or(0.0),

            uv_index: day.uv,
            daily_will_it_rain: day.daily_will_it_rain,
            daily_chance_of_rain: day.daily_chance_of_rain,
            daily_will_it_snow: day.daily_will_it_snow,
            daily_chance_of_snow: day.daily_chance_of_snow,

            sunrise: astro.sunrise.clone(),
            sunset: astro.sunset.clone(),
            moonrise: astro.moonrise.clone(),
            moonset: astro.moonset.clone(),
            moon_phase: astro.moon_phase.clone(),
            moon_illumination: astro.moon_illumination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_response, snapshot_at};
    use serde_json::json;

    const EPS: f64 = 1e-9;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(snapshot_at(2025, 3, 14, 9, 30, 0))
    }

    #[test]
    fn test_today_uses_current_conditions() -> Result<(), NormalizeError> {
        let raw = sample_response(as_of(), 3);
        let records = normalizer().normalize_as_of(&raw, "Leeds", as_of())?;

        let today = &records[0];
        assert!(today.is_today());
        assert_eq!(today.temperature, 12.0);
        assert_ne!(today.temperature, today.avg_temp);
        assert_eq!(today.feels_like, Some(10.4));
        assert_eq!(today.pressure, Some(1009.0));
        assert_eq!(today.wind_direction, Some(240));
        assert_eq!(today.cloudiness, Some(75));
        assert_eq!(today.humidity, 87.0);
        assert_eq!(today.avg_humidity, 84.0);
        assert_eq!(today.weather_condition, "Light rain");
        assert_eq!(today.weather_description, "Light rain");
        assert_eq!(today.precip_mm, 0.4);
        assert_eq!(today.total_precip_mm, 2.5);
        assert!((today.wind_speed - 18.0 / 3.6).abs() < EPS);
        assert!((today.visibility - 8000.0).abs() < EPS);
        Ok(())
    }

    #[test]
    fn test_future_days_use_day_aggregates() -> Result<(), NormalizeError> {
        let raw = sample_response(as_of(), 3);
        let records = normalizer().normalize_as_of(&raw, "Leeds", as_of())?;

        for (i, record) in records.iter().enumerate().skip(1) {
            assert!(!record.is_today());
            assert_eq!(record.days_ahead, i as i64);
            assert_eq!(record.temperature, record.avg_temp);
            assert!(record.feels_like.is_none());
            assert!(record.pressure.is_none());
            assert!(record.wind_direction.is_none());
            assert!(record.cloudiness.is_none());
            assert_eq!(record.humidity, record.avg_humidity);
            assert_eq!(record.precip_mm, record.total_precip_mm);
            assert_eq!(record.weather_condition, format!("Day condition {}", i));
            assert!((record.wind_speed - record.max_wind_kph / 3.6).abs() < EPS);
            assert!((record.visibility - record.avg_visibility_km * 1000.0).abs() < EPS);
        }
        Ok(())
    }

    #[test]
    fn test_records_share_snapshot_and_location() -> Result<(), NormalizeError> {
        let raw = sample_response(as_of(), 3);
        let normalizer = normalizer();
        let records = normalizer.normalize_as_of(&raw, "Leeds", as_of())?;

        assert_eq!(normalizer.snapshot_timestamp(), snapshot_at(2025, 3, 14, 9, 30, 0));
        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.snapshot_timestamp, normalizer.snapshot_timestamp());
            assert_eq!(record.location_name, "Leeds");
            assert_eq!(record.latitude, 53.8);
            assert_eq!(record.longitude, -1.58);
            assert_eq!(record.moon_illumination, 64);
        }
        let offsets: Vec<i64> = records.iter().map(|r| r.days_ahead).collect();
        assert_eq!(offsets, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_unit_conversions() {
        for v in [0.0, 3.6, 18.0, 27.7, 101.3] {
            assert!((kph_to_mps(v) - v / 3.6).abs() < EPS);
            assert!((km_to_m(v) - v * 1000.0).abs() < EPS);
        }
    }

    #[test]
    fn test_missing_forecast_key_fails_location() {
        let mut raw = sample_response(as_of(), 3);
        raw.as_object_mut().unwrap().remove("forecast");

        match normalizer().normalize_as_of(&raw, "Belfast", as_of()) {
            Err(NormalizeError::Shape { location, source }) => {
                assert_eq!(location, "Belfast");
                assert!(source.to_string().contains("forecast"));
            }
            other => panic!("expected Shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_current_field_only_matters_for_today() -> Result<(), NormalizeError> {
        let mut raw = sample_response(as_of(), 3);
        raw["current"].as_object_mut().unwrap().remove("temp_c");

        let result = normalizer().normalize_as_of(&raw, "Leeds", as_of());
        assert!(matches!(
            result,
            Err(NormalizeError::MissingKey { key: "current.temp_c", .. })
        ));

        // Same document viewed from the day before: no row is today.
        let yesterday = as_of().pred_opt().unwrap();
        let records = normalizer().normalize_as_of(&raw, "Leeds", yesterday)?;
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| !r.is_today()));
        Ok(())
    }

    #[test]
    fn test_optional_fields_default() -> Result<(), NormalizeError> {
        let mut raw = sample_response(as_of(), 2);
        raw["current"].as_object_mut().unwrap().remove("precip_mm");
        for day in raw["forecast"]["forecastday"].as_array_mut().unwrap() {
            let day = day["day"].as_object_mut().unwrap();
            day.remove("totalsnow_cm");
            day.remove("uv");
        }

        let records = normalizer().normalize_as_of(&raw, "Leeds", as_of())?;
        assert_eq!(records[0].precip_mm, 0.0);
        assert!(records.iter().all(|r| r.total_snow_cm == 0.0));
        assert!(records.iter().all(|r| r.uv_index.is_none()));
        Ok(())
    }

    #[test]
    fn test_past_dates_get_negative_offsets() -> Result<(), NormalizeError> {
        let raw = sample_response(as_of(), 2);
        let tomorrow = as_of().succ_opt().unwrap();
        let records = normalizer().normalize_as_of(&raw, "Leeds", tomorrow)?;

        assert_eq!(records[0].days_ahead, -1);
        assert!(records[0].feels_like.is_none());
        assert!(records[1].is_today());
        assert_eq!(records[1].temperature, 12.0);
        Ok(())
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let mut raw = sample_response(as_of(), 1);
        raw["forecast"]["forecastday"][0]["date"] = json!("14/03/2025");

        let result = normalizer().normalize_as_of(&raw, "Leeds", as_of());
        assert!(matches!(
            result,
            Err(NormalizeError::InvalidDate { ref value, .. }) if value == "14/03/2025"
        ));
    }
}
