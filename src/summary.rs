//! Aggregate statistics over a run's table, for people to read.

use crate::types::forecast_record::ForecastRecord;
use crate::types::forecast_table::ForecastTable;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// A location counts as rain-risk when its daily chance of rain is strictly above this.
pub const RAIN_RISK_THRESHOLD: i64 = 50;
const SAMPLE_ROWS: usize = 10;
const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq)]
pub struct LocationTemperature {
    pub location: String,
    pub temperature: f64,
}

/// Statistics over the `days_ahead == 0` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TodaySummary {
    pub min_temp: f64,
    pub max_temp: f64,
    pub mean_temperature: f64,
    pub warmest: LocationTemperature,
    pub coldest: LocationTemperature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub days_ahead: i64,
    /// Date of the first row seen for this offset.
    pub forecast_date: NaiveDate,
    pub mean_avg_temp: f64,
    pub rain_risk_locations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub location: String,
    pub forecast_date: NaiveDate,
    pub days_ahead: i64,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub chance_of_rain: i64,
}

impl From<&ForecastRecord> for SampleRow {
    fn from(r: &ForecastRecord) -> Self {
        Self {
            location: r.location_name.clone(),
            forecast_date: r.forecast_date,
            days_ahead: r.days_ahead,
            temperature: r.temperature,
            temp_min: r.temp_min,
            temp_max: r.temp_max,
            humidity: r.humidity,
            wind_speed: r.wind_speed,
            chance_of_rain: r.daily_chance_of_rain,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_records: usize,
    pub today: Option<TodaySummary>,
    /// One entry per distinct `days_ahead`, ascending. Negative offsets (dates
    /// already past) sort before today.
    pub days: Vec<DaySummary>,
    pub sample: Vec<SampleRow>,
}

impl RunSummary {
    pub fn from_table(table: &ForecastTable) -> Self {
        let records = table.records();

        Self {
            total_records: records.len(),
            today: summarize_today(records),
            days: summarize_days(records),
            sample: records.iter().take(SAMPLE_ROWS).map(SampleRow::from).collect(),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn summarize_today(records: &[ForecastRecord]) -> Option<TodaySummary> {
    let today: Vec<&ForecastRecord> = records.iter().filter(|r| r.is_today()).collect();
    let first = today.first()?;

    let mut warmest = *first;
    let mut coldest = *first;
    // Strict comparisons keep the first record on ties.
    for &record in &today[1..] {
        if record.temperature > warmest.temperature {
            warmest = record;
        }
        if record.temperature < coldest.temperature {
            coldest = record;
        }
    }

    Some(TodaySummary {
        min_temp: today.iter().map(|r| r.temp_min).fold(f64::INFINITY, f64::min),
        max_temp: today
            .iter()
            .map(|r| r.temp_max)
            .fold(f64::NEG_INFINITY, f64::max),
        mean_temperature: mean(today.iter().map(|r| r.temperature))?,
        warmest: LocationTemperature {
            location: warmest.location_name.clone(),
            temperature: warmest.temperature,
        },
        coldest: LocationTemperature {
            location: coldest.location_name.clone(),
            temperature: coldest.temperature,
        },
    })
}

fn summarize_days(records: &[ForecastRecord]) -> Vec<DaySummary> {
    let mut by_offset: BTreeMap<i64, Vec<&ForecastRecord>> = BTreeMap::new();
    for record in records {
        by_offset.entry(record.days_ahead).or_default().push(record);
    }

    by_offset
        .into_iter()
        .filter_map(|(days_ahead, group)| {
            Some(DaySummary {
                days_ahead,
                forecast_date: group.first()?.forecast_date,
                mean_avg_temp: mean(group.iter().map(|r| r.avg_temp))?,
                rain_risk_locations: group
                    .iter()
                    .filter(|r| r.daily_chance_of_rain > RAIN_RISK_THRESHOLD)
                    .count(),
            })
        })
        .collect()
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{}", rule)?;
        writeln!(f, "WEATHER FORECAST SUMMARY ({} records)", self.total_records)?;
        writeln!(f, "{}", rule)?;

        if let Some(today) = &self.today {
            writeln!(f)?;
            writeln!(f, "TODAY'S WEATHER:")?;
            writeln!(
                f,
                "Temperature Range: {:.1}C to {:.1}C",
                today.min_temp, today.max_temp
            )?;
            writeln!(f, "Current Average: {:.1}C", today.mean_temperature)?;
            writeln!(
                f,
                "Warmest: {} at {:.1}C",
                today.warmest.location, today.warmest.temperature
            )?;
            writeln!(
                f,
                "Coldest: {} at {:.1}C",
                today.coldest.location, today.coldest.temperature
            )?;
        }

        writeln!(f)?;
        writeln!(f, "FORECAST COVERAGE:")?;
        for day in &self.days {
            writeln!(
                f,
                "  Day {:+} ({}): Avg {:.1}C, {} locations with >{}% rain chance",
                day.days_ahead,
                day.forecast_date,
                day.mean_avg_temp,
                day.rain_risk_locations,
                RAIN_RISK_THRESHOLD
            )?;
        }

        writeln!(f)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "SAMPLE DATA (first {} rows):", SAMPLE_ROWS)?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<14} {:<10} {:>5} {:>6} {:>6} {:>6} {:>6} {:>6} {:>5}",
            "location", "date", "ahead", "temp", "min", "max", "hum", "wind", "rain%"
        )?;
        for row in &self.sample {
            writeln!(
                f,
                "{:<14} {:<10} {:>5} {:>6.1} {:>6.1} {:>6.1} {:>6.1} {:>6.1} {:>5}",
                row.location,
                row.forecast_date,
                row.days_ahead,
                row.temperature,
                row.temp_min,
                row.temp_max,
                row.humidity,
                row.wind_speed,
                row.chance_of_rain
            )?;
        }
        write!(f, "{}", rule)
    }
}
