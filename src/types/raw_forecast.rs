//! Typed view of the WeatherAPI `forecast.json` response.
//!
//! Only the keys the normalizer reads are modelled; everything else in the
//! document is ignored. Current-conditions fields are all optional here because
//! they are only required when a forecast day turns out to be today, which is
//! decided later by the normalizer.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
pub struct RawForecastResponse {
    pub location: RawLocation,
    pub current: RawCurrent,
    pub forecast: RawForecast,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLocation {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurrent {
    pub temp_c: Option<f64>,      // °C
    pub feelslike_c: Option<f64>, // °C
    pub condition: Option<RawCondition>,
    pub pressure_mb: Option<f64>,
    pub humidity: Option<f64>,    // %
    pub wind_kph: Option<f64>,    // km/h
    pub wind_degree: Option<i64>, // degrees
    pub cloud: Option<i64>,       // %
    pub vis_km: Option<f64>,      // km
    pub precip_mm: Option<f64>,   // mm, defaults to 0 when absent
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawForecast {
    pub forecastday: Vec<RawForecastDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawForecastDay {
    /// Local calendar date of the forecast, `YYYY-MM-DD`.
    pub date: String,
    pub day: RawDay,
    pub astro: RawAstro,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDay {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    pub avgtemp_c: f64,
    pub maxwind_kph: f64,
    pub totalprecip_mm: f64,
    pub totalsnow_cm: Option<f64>,
    pub avgvis_km: f64,
    pub avghumidity: f64,
    #[serde(deserialize_with = "int_or_numeric_string")]
    pub daily_will_it_rain: i64,
    #[serde(deserialize_with = "int_or_numeric_string")]
    pub daily_chance_of_rain: i64,
    #[serde(deserialize_with = "int_or_numeric_string")]
    pub daily_will_it_snow: i64,
    #[serde(deserialize_with = "int_or_numeric_string")]
    pub daily_chance_of_snow: i64,
    pub condition: RawCondition,
    pub uv: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAstro {
    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
    pub moon_phase: String,
    #[serde(deserialize_with = "int_or_numeric_string")]
    pub moon_illumination: i64,
}

/// The API has shipped some integer fields as JSON strings (`"89"`) in older
/// versions, so both shapes are accepted.
fn int_or_numeric_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrText {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match IntOrText::deserialize(deserializer)? {
        IntOrText::Int(value) => Ok(value),
        IntOrText::Float(value) => Ok(value.round() as i64),
        IntOrText::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid integer '{}': {}", text, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn astro(illumination: serde_json::Value) -> serde_json::Value {
        json!({
            "sunrise": "07:31 AM",
            "sunset": "06:02 PM",
            "moonrise": "11:40 PM",
            "moonset": "02:10 PM",
            "moon_phase": "Waning Gibbous",
            "moon_illumination": illumination,
        })
    }

    #[test]
    fn test_moon_illumination_accepts_number_and_string() {
        let from_number: RawAstro = serde_json::from_value(astro(json!(64))).unwrap();
        let from_string: RawAstro = serde_json::from_value(astro(json!("64"))).unwrap();
        let from_float: RawAstro = serde_json::from_value(astro(json!(63.6))).unwrap();

        assert_eq!(from_number.moon_illumination, 64);
        assert_eq!(from_string.moon_illumination, 64);
        assert_eq!(from_float.moon_illumination, 64);
    }

    #[test]
    fn test_moon_illumination_rejects_text() {
        let result = serde_json::from_value::<RawAstro>(astro(json!("bright")));
        assert!(result.is_err());
    }

    #[test]
    fn test_current_fields_are_optional() {
        let current: RawCurrent = serde_json::from_value(json!({ "temp_c": 12.5 })).unwrap();
        assert_eq!(current.temp_c, Some(12.5));
        assert!(current.wind_kph.is_none());
        assert!(current.condition.is_none());
    }
}
