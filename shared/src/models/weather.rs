//! Weather data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One weather observation or forecast point for the farm's region
///
/// Samples are immutable, ordered by timestamp and deduplicated by
/// timestamp on ingestion. Missing fields are tolerated; the favorability
/// function substitutes a neutral contribution for them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSample {
    pub timestamp: DateTime<Utc>,
    pub temperature_celsius: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub wind_speed_mps: Option<f64>,
}

impl WeatherSample {
    /// A sample with every field present, mostly useful in tests
    pub fn complete(
        timestamp: DateTime<Utc>,
        temperature_celsius: f64,
        humidity_percent: f64,
        precipitation_mm: f64,
        wind_speed_mps: f64,
    ) -> Self {
        Self {
            timestamp,
            temperature_celsius: Some(temperature_celsius),
            humidity_percent: Some(humidity_percent),
            precipitation_mm: Some(precipitation_mm),
            wind_speed_mps: Some(wind_speed_mps),
        }
    }
}
