//! Configuration management for the Pest Outbreak Forecaster
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PIF_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Forecasting engine tunables
    pub engine: EngineConfig,

    /// Weather provider configuration
    pub weather: WeatherProviderConfig,

    /// Detector microservice configuration
    pub detector: DetectorConfig,

    /// Alert dispatch configuration
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

/// Forecasting engine tunables
///
/// The defaults are reasonable starting points for the stated behavior,
/// not agronomic ground truth; operators are expected to tune them per
/// pest species and farm.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Minimum detector confidence for a box to become a detection
    pub min_confidence: f64,

    /// IoU above which overlapping same-class boxes are suppressed
    pub nms_iou_threshold: f64,

    /// How far back detections contribute to cell density, in hours
    pub lookback_window_hours: i64,

    /// Half-life of a detection's influence on decayed density, in hours
    pub decay_half_life_hours: f64,

    /// Density scale at which the normalized density term reaches 0.5,
    /// in confidence-weighted detections per km²
    pub density_scale: f64,

    /// Blend weight on the decayed-density term
    pub weight_density: f64,

    /// Blend weight on the favorability term
    pub weight_favorability: f64,

    /// Risk score above which a cell heads toward WARNING
    pub warning_threshold: f64,

    /// Risk score above which WARNING escalates immediately
    pub escalation_threshold: f64,

    /// Consecutive breach (or clear) cycles required to change state
    pub debounce_cycles: u32,

    /// Unresolved WARNING escalates after this long, in hours
    pub warning_timeout_hours: i64,

    /// Spacing of forecast steps, in hours
    pub forecast_step_hours: i64,

    /// Newest weather sample older than this makes a cycle degraded, in hours
    pub max_weather_age_hours: i64,

    /// Confidence band half-width per sqrt(hour) of horizon distance
    pub band_growth: f64,

    /// Favorability function parameters
    pub favorability: FavorabilityConfig,
}

/// Parameters of the weather favorability function
#[derive(Debug, Deserialize, Clone)]
pub struct FavorabilityConfig {
    /// Lower edge of the pest's optimal temperature range, °C
    pub optimal_temp_low: f64,

    /// Upper edge of the pest's optimal temperature range, °C
    pub optimal_temp_high: f64,

    /// Degrees beyond the optimal range at which suitability reaches zero
    pub temp_tolerance: f64,

    /// Relative humidity at or below which the humidity factor is zero, %
    pub humidity_floor: f64,

    /// Relative humidity at or above which the humidity factor is one, %
    pub humidity_saturation: f64,

    /// Hourly precipitation below which no washout penalty applies, mm
    pub washout_start_mm: f64,

    /// Hourly precipitation at which the washout penalty bottoms out, mm
    pub washout_full_mm: f64,

    /// Minimum value of the washout multiplier
    pub washout_floor: f64,

    /// Contribution substituted for a missing sample field
    pub neutral_contribution: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherProviderConfig {
    /// Weather API endpoint
    pub api_endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    /// Detector microservice endpoint; empty disables image ingestion
    pub api_endpoint: String,

    /// Detector API key
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DispatchConfig {
    /// Webhook URL alert events are POSTed to; empty means log-only
    pub webhook_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("PIF_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("engine.min_confidence", 0.5)?
            .set_default("engine.nms_iou_threshold", 0.4)?
            .set_default("engine.lookback_window_hours", 168)?
            .set_default("engine.decay_half_life_hours", 72.0)?
            .set_default("engine.density_scale", 1.0)?
            .set_default("engine.weight_density", 0.5)?
            .set_default("engine.weight_favorability", 0.5)?
            .set_default("engine.warning_threshold", 0.5)?
            .set_default("engine.escalation_threshold", 0.8)?
            .set_default("engine.debounce_cycles", 2)?
            .set_default("engine.warning_timeout_hours", 24)?
            .set_default("engine.forecast_step_hours", 3)?
            .set_default("engine.max_weather_age_hours", 6)?
            .set_default("engine.band_growth", 0.02)?
            .set_default("engine.favorability.optimal_temp_low", 22.0)?
            .set_default("engine.favorability.optimal_temp_high", 30.0)?
            .set_default("engine.favorability.temp_tolerance", 10.0)?
            .set_default("engine.favorability.humidity_floor", 30.0)?
            .set_default("engine.favorability.humidity_saturation", 85.0)?
            .set_default("engine.favorability.washout_start_mm", 2.0)?
            .set_default("engine.favorability.washout_full_mm", 10.0)?
            .set_default("engine.favorability.washout_floor", 0.2)?
            .set_default("engine.favorability.neutral_contribution", 0.5)?
            .set_default("weather.api_endpoint", "https://api.open-meteo.com/v1/forecast")?
            .set_default("weather.timeout_secs", 30)?
            .set_default("detector.api_endpoint", "")?
            .set_default("detector.api_key", "")?
            .set_default("detector.timeout_secs", 60)?
            .set_default("dispatch.webhook_url", "")?
            .set_default("dispatch.timeout_secs", 10)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PIF_ prefix)
            .add_source(
                Environment::with_prefix("PIF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            nms_iou_threshold: 0.4,
            lookback_window_hours: 168,
            decay_half_life_hours: 72.0,
            density_scale: 1.0,
            weight_density: 0.5,
            weight_favorability: 0.5,
            warning_threshold: 0.5,
            escalation_threshold: 0.8,
            debounce_cycles: 2,
            warning_timeout_hours: 24,
            forecast_step_hours: 3,
            max_weather_age_hours: 6,
            band_growth: 0.02,
            favorability: FavorabilityConfig::default(),
        }
    }
}

impl Default for FavorabilityConfig {
    fn default() -> Self {
        Self {
            optimal_temp_low: 22.0,
            optimal_temp_high: 30.0,
            temp_tolerance: 10.0,
            humidity_floor: 30.0,
            humidity_saturation: 85.0,
            washout_start_mm: 2.0,
            washout_full_mm: 10.0,
            washout_floor: 0.2,
            neutral_contribution: 0.5,
        }
    }
}
