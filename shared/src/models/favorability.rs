//! Favorability index models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How conducive weather at one timestamp is to pest growth, in `[0,1]`
///
/// Derived from a `WeatherSample` by a pure function; cached alongside the
/// sample timestamp, never persisted independently of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavorabilityIndex {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub factors: FavorabilityFactors,
}

/// The contributing factors behind a favorability value, for explainability
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavorabilityFactors {
    /// Temperature suitability, 1.0 inside the species' optimal range
    pub temperature: f64,
    /// Humidity suitability, rising with relative humidity
    pub humidity: f64,
    /// Washout multiplier, 1.0 with no heavy precipitation
    pub precipitation_penalty: f64,
}
