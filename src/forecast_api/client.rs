use crate::forecast_api::error::FetchError;
use bon::bon;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com/v1/forecast.json";
pub const DEFAULT_COUNTRY: &str = "UK";
pub const DEFAULT_FORECAST_DAYS: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the WeatherAPI forecast endpoint.
///
/// Each call to [`ForecastApi::fetch`] performs exactly one request. There is
/// no retry and no throttling here; pacing between locations is the caller's job.
#[derive(Debug, Clone)]
pub struct ForecastApi {
    client: Client,
    base_url: String,
    api_key: String,
    country: String,
    days: u32,
}

#[bon]
impl ForecastApi {
    /// Creates a new `ForecastApi`.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.api_key(String)`: **Required.** The WeatherAPI credential, sent as the `key` query parameter.
    /// * `.base_url(String)`: Optional. Full URL of the `forecast.json` endpoint. Defaults to [`DEFAULT_BASE_URL`].
    /// * `.country(String)`: Optional. Qualifier appended to every location (`"Leeds,UK"`). Defaults to `"UK"`.
    /// * `.days(u32)`: Optional. Forecast horizon including today. Defaults to `3`.
    /// * `.timeout(Duration)`: Optional. Whole-request timeout. Defaults to 30 seconds.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the underlying HTTP client cannot be created.
    ///
    /// # Examples
    ///
    /// ```
    /// # use weather_collector::{ForecastApi, FetchError};
    /// # fn main() -> Result<(), FetchError> {
    /// let api = ForecastApi::builder()
    ///     .api_key("secret".to_string())
    ///     .days(5)
    ///     .build()?;
    /// assert_eq!(api.days(), 5);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        country: Option<String>,
        days: Option<u32>,
        timeout: Option<Duration>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            country: country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            days: days.unwrap_or(DEFAULT_FORECAST_DAYS),
        })
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// Fetches the raw forecast document for one location.
    ///
    /// The body is decoded as JSON but otherwise left untouched; interpreting it
    /// is the normalizer's job.
    ///
    /// # Errors
    ///
    /// * [`FetchError::NetworkRequest`] for transport failures (DNS, connect, timeout).
    /// * [`FetchError::HttpStatus`] for any non-2xx response.
    /// * [`FetchError::Decode`] when the body is not valid JSON.
    pub async fn fetch(&self, location: &str) -> Result<Value, FetchError> {
        let query = format!("{},{}", location, self.country);
        let days = self.days.to_string();
        debug!("Requesting {}-day forecast for {}", self.days, query);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query.as_str()),
                ("days", days.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(location.to_string(), e.without_url()))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                let e = e.without_url();
                warn!("HTTP error for {}: {}", location, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        location: location.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(location.to_string(), e)
                });
            }
        };

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Decode(location.to_string(), e.without_url()))
    }
}
