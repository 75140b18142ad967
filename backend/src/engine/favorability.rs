//! Weather feature extraction
//!
//! Maps each `WeatherSample` to a `FavorabilityIndex`: a pure, deterministic
//! score of how conducive conditions are to pest growth. Favorability rises
//! with humidity and with temperature inside the species' optimal range,
//! and heavy precipitation washes it back down.

use shared::{clamp_unit, FavorabilityFactors, FavorabilityIndex, WeatherSample};

use crate::config::FavorabilityConfig;

/// Compute the favorability index for one sample
///
/// Pure: identical input always yields an identical index. Missing fields
/// contribute the configured neutral value instead of failing the sample.
pub fn favorability_for(sample: &WeatherSample, params: &FavorabilityConfig) -> FavorabilityIndex {
    let temperature = sample
        .temperature_celsius
        .map(|t| temperature_factor(t, params))
        .unwrap_or(params.neutral_contribution);

    let humidity = sample
        .humidity_percent
        .map(|h| humidity_factor(h, params))
        .unwrap_or(params.neutral_contribution);

    // Missing precipitation is absence of washout evidence, not neutral
    let precipitation_penalty = sample
        .precipitation_mm
        .map(|p| washout_penalty(p, params))
        .unwrap_or(1.0);

    let value = clamp_unit((temperature + humidity) / 2.0 * precipitation_penalty);

    FavorabilityIndex {
        timestamp: sample.timestamp,
        value,
        factors: FavorabilityFactors {
            temperature,
            humidity,
            precipitation_penalty,
        },
    }
}

/// Compute indices for an ordered sample sequence
pub fn favorability_series(
    samples: &[WeatherSample],
    params: &FavorabilityConfig,
) -> Vec<FavorabilityIndex> {
    samples.iter().map(|s| favorability_for(s, params)).collect()
}

/// 1.0 inside the optimal range, linear falloff to 0 over the tolerance band
fn temperature_factor(temp: f64, params: &FavorabilityConfig) -> f64 {
    if !temp.is_finite() {
        return params.neutral_contribution;
    }
    let distance = if temp < params.optimal_temp_low {
        params.optimal_temp_low - temp
    } else if temp > params.optimal_temp_high {
        temp - params.optimal_temp_high
    } else {
        return 1.0;
    };
    clamp_unit(1.0 - distance / params.temp_tolerance)
}

/// Linear ramp from the dry floor to the saturation humidity
fn humidity_factor(humidity: f64, params: &FavorabilityConfig) -> f64 {
    if !humidity.is_finite() {
        return params.neutral_contribution;
    }
    clamp_unit((humidity - params.humidity_floor) / (params.humidity_saturation - params.humidity_floor))
}

/// 1.0 below the washout start, ramping down to the floor at full washout
fn washout_penalty(precipitation_mm: f64, params: &FavorabilityConfig) -> f64 {
    if !precipitation_mm.is_finite() || precipitation_mm <= params.washout_start_mm {
        return 1.0;
    }
    if precipitation_mm >= params.washout_full_mm {
        return params.washout_floor;
    }
    let span = params.washout_full_mm - params.washout_start_mm;
    let progress = (precipitation_mm - params.washout_start_mm) / span;
    1.0 - progress * (1.0 - params.washout_floor)
}
