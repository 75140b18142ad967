//! Weather provider client
//!
//! Integrates with the Open-Meteo API for hourly observations and forecasts.
//! The provider seam is a trait so the engine and its tests never depend on
//! the network.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use shared::{GeoPoint, WeatherSample};

use crate::config::WeatherProviderConfig;
use crate::error::{AppError, AppResult};

/// Source of hourly weather samples for a location
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch hourly samples covering `past_days` back and `forecast_days`
    /// ahead of the current time
    async fn fetch_hourly(
        &self,
        location: GeoPoint,
        past_days: u32,
        forecast_days: u32,
    ) -> AppResult<Vec<WeatherSample>>;
}

/// Open-Meteo API client
#[derive(Clone)]
pub struct OpenMeteoClient {
    http_client: Client,
    base_url: String,
}

/// Open-Meteo forecast response
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: OpenMeteoHourly,
}

/// Parallel hourly arrays; a null entry means the value is unavailable
#[derive(Debug, Deserialize)]
struct OpenMeteoHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherProviderConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.api_endpoint.clone(),
        })
    }

    /// Create a client against a custom base URL (for testing)
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
        }
    }

    fn convert_response(data: OpenMeteoResponse) -> Vec<WeatherSample> {
        let hourly = data.hourly;
        let mut samples = Vec::with_capacity(hourly.time.len());

        for (i, time) in hourly.time.iter().enumerate() {
            // Open-Meteo reports naive UTC timestamps like "2026-08-25T14:00"
            let Ok(naive) = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M") else {
                tracing::warn!(time = %time, "Skipping sample with unparseable timestamp");
                continue;
            };
            samples.push(WeatherSample {
                timestamp: naive.and_utc(),
                temperature_celsius: hourly.temperature_2m.get(i).copied().flatten(),
                humidity_percent: hourly.relative_humidity_2m.get(i).copied().flatten(),
                precipitation_mm: hourly.precipitation.get(i).copied().flatten(),
                wind_speed_mps: hourly.wind_speed_10m.get(i).copied().flatten(),
            });
        }
        samples
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn fetch_hourly(
        &self,
        location: GeoPoint,
        past_days: u32,
        forecast_days: u32,
    ) -> AppResult<Vec<WeatherSample>> {
        let url = format!(
            "{}?latitude={}&longitude={}\
             &hourly=temperature_2m,relative_humidity_2m,precipitation,wind_speed_10m\
             &wind_speed_unit=ms&past_days={}&forecast_days={}",
            self.base_url, location.latitude, location.longitude, past_days, forecast_days
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::WeatherUnavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::WeatherUnavailable(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let data: OpenMeteoResponse = response
            .json()
            .await
            .map_err(|e| AppError::WeatherUnavailable(format!("Failed to parse response: {}", e)))?;

        Ok(Self::convert_response(data))
    }
}
