// Fixtures shared by the unit tests of several modules.

use crate::types::forecast_record::ForecastRecord;
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde_json::{json, Value};

pub fn snapshot_at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, min, sec))
        .expect("valid test timestamp")
}

/// A record shaped like normalizer output: current-only fields are set on day 0
/// and empty on later days.
pub fn sample_record(location: &str, snapshot: NaiveDateTime, days_ahead: u64) -> ForecastRecord {
    let today = days_ahead == 0;
    let offset = days_ahead as f64;
    ForecastRecord {
        snapshot_timestamp: snapshot,
        location_name: location.to_string(),
        forecast_date: snapshot.date() + Days::new(days_ahead),
        days_ahead: days_ahead as i64,
        latitude: 53.8,
        longitude: -1.55,
        temperature: 11.5 + offset,
        feels_like: today.then_some(9.75),
        temp_min: 6.0 + offset,
        temp_max: 14.25 + offset,
        avg_temp: 10.0 + offset,
        weather_condition: "Partly cloudy".to_string(),
        weather_description: "Partly cloudy".to_string(),
        pressure: today.then_some(1012.0),
        humidity: 81.0,
        avg_humidity: 78.0,
        wind_speed: 4.5,
        wind_direction: today.then_some(230),
        max_wind_kph: 27.0,
        cloudiness: today.then_some(50),
        visibility: 10_000.0,
        avg_visibility_km: 9.5,
        precip_mm: 0.25,
        total_precip_mm: 1.5,
        total_snow_cm: 0.0,
        uv_index: if today { Some(2.0) } else { None },
        daily_will_it_rain: 1,
        daily_chance_of_rain: 40 + 10 * days_ahead as i64,
        daily_will_it_snow: 0,
        daily_chance_of_snow: 0,
        sunrise: "07:02 AM".to_string(),
        sunset: "06:11 PM".to_string(),
        moonrise: "09:15 PM".to_string(),
        moonset: "08:40 AM".to_string(),
        moon_phase: "Waxing Gibbous".to_string(),
        moon_illumination: 82,
    }
}

fn forecast_day(date: NaiveDate, index: u64) -> Value {
    let offset = index as f64;
    json!({
        "date": date.format("%Y-%m-%d").to_string(),
        "date_epoch": 1_700_000_000u64 + index * 86_400,
        "day": {
            "maxtemp_c": 14.0 + offset,
            "mintemp_c": 5.0 + offset,
            "avgtemp_c": 9.5 + offset,
            "maxwind_kph": 36.0 + offset,
            "totalprecip_mm": 2.5,
            "totalsnow_cm": 0.0,
            "avgvis_km": 9.8,
            "avghumidity": 84,
            "daily_will_it_rain": 1,
            "daily_chance_of_rain": 60 + index * 10,
            "daily_will_it_snow": 0,
            "daily_chance_of_snow": 0,
            "condition": { "text": format!("Day condition {}", index), "code": 1063 },
            "uv": 1.0
        },
        "astro": {
            "sunrise": "07:31 AM",
            "sunset": "06:02 PM",
            "moonrise": "11:40 PM",
            "moonset": "02:10 PM",
            "moon_phase": "Waning Gibbous",
            "moon_illumination": 64
        },
        "hour": []
    })
}

/// A `forecast.json` document with `days` forecast days starting at `start`.
pub fn sample_response(start: NaiveDate, days: u64) -> Value {
    let forecastday: Vec<Value> = (0..days)
        .map(|i| forecast_day(start + Days::new(i), i))
        .collect();

    json!({
        "location": {
            "name": "Leeds",
            "country": "United Kingdom",
            "lat": 53.8,
            "lon": -1.58,
            "localtime": "2025-03-14 9:30"
        },
        "current": {
            "temp_c": 12.0,
            "feelslike_c": 10.4,
            "condition": { "text": "Light rain", "code": 1183 },
            "pressure_mb": 1009.0,
            "humidity": 87,
            "wind_kph": 18.0,
            "wind_degree": 240,
            "cloud": 75,
            "vis_km": 8.0,
            "precip_mm": 0.4,
            "uv": 1.0
        },
        "forecast": { "forecastday": forecastday }
    })
}
