//! Risk model
//!
//! Combines a per-cell exponentially time-decayed detection accumulator
//! with weather favorability into an outbreak-risk score in `[0,1]`, and
//! projects the score forward over a forecast horizon: the density signal
//! decays with no new detections assumed, while favorability follows the
//! weather forecast, so risk can rise on favorable weather alone.

use chrono::{DateTime, Utc};
use shared::{clamp_unit, CellId, ConfidenceBand, Detection, FavorabilityIndex, RiskForecast};
use uuid::Uuid;

use crate::config::EngineConfig;

const LN_2: f64 = std::f64::consts::LN_2;

/// Decay factor for a detection of the given age
///
/// `exp(-ln 2 · age / half_life)`: influence halves every half-life.
pub fn decay(age_hours: f64, half_life_hours: f64) -> f64 {
    (-LN_2 * age_hours.max(0.0) / half_life_hours).exp()
}

/// Time-decayed, area-normalized density signal for one cell
pub fn decayed_density(
    history: &[Detection],
    area_km2: f64,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> f64 {
    if area_km2 <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = history
        .iter()
        .map(|d| {
            let age_hours = (now - d.captured_at).num_seconds() as f64 / 3600.0;
            d.confidence * decay(age_hours, config.decay_half_life_hours)
        })
        .sum();
    weighted / area_km2
}

/// Saturating normalization of a density into `[0,1)`
///
/// `d / (d + scale)`: monotone, equals 0.5 at the configured scale, and
/// keeps the blend bounded for any input magnitude.
pub fn normalize_density(density: f64, config: &EngineConfig) -> f64 {
    let d = density.max(0.0);
    d / (d + config.density_scale)
}

/// Weighted blend of the density and favorability signals
///
/// Either signal alone is noisy; risk requires both corroborating. A cell
/// with no detection history still gets a favorability-driven baseline.
pub fn blend(normalized_density: f64, favorability: f64, config: &EngineConfig) -> f64 {
    clamp_unit(
        config.weight_density * normalized_density + config.weight_favorability * favorability,
    )
}

/// Current risk score for one cell
pub fn risk_score(
    history: &[Detection],
    area_km2: f64,
    favorability: f64,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> f64 {
    let density = decayed_density(history, area_km2, now, config);
    blend(normalize_density(density, config), favorability, config)
}

/// Favorability value at a timestamp: the newest index at or before it
pub fn favorability_at(series: &[FavorabilityIndex], at: DateTime<Utc>) -> Option<f64> {
    series
        .iter()
        .filter(|idx| idx.timestamp <= at)
        .max_by_key(|idx| idx.timestamp)
        .map(|idx| idx.value)
}

/// Project one cell's risk forward over the horizon
///
/// The caller guarantees the favorability series reaches the end of the
/// horizon; steps falling before the series starts score the configured
/// neutral contribution rather than a silent zero. The density decay
/// curve is held forward with no new detections assumed; the confidence
/// band widens with the square root of horizon distance.
#[allow(clippy::too_many_arguments)]
pub fn project_forecast(
    farm_id: Uuid,
    cell_id: CellId,
    history: &[Detection],
    area_km2: f64,
    favorability_series: &[FavorabilityIndex],
    now: DateTime<Utc>,
    horizon_hours: i64,
    config: &EngineConfig,
) -> Vec<RiskForecast> {
    let base_density = decayed_density(history, area_km2, now, config);
    let steps = (horizon_hours / config.forecast_step_hours).max(1);

    (1..=steps)
        .map(|step| {
            let hours_ahead = (step * config.forecast_step_hours) as f64;
            let at = now + chrono::Duration::hours(step * config.forecast_step_hours);

            let density = base_density * decay(hours_ahead, config.decay_half_life_hours);
            let favorability = favorability_at(favorability_series, at)
                .unwrap_or(config.favorability.neutral_contribution);
            let predicted = blend(normalize_density(density, config), favorability, config);

            let half_width = config.band_growth * hours_ahead.sqrt();
            RiskForecast {
                farm_id,
                cell_id,
                horizon_timestamp: at,
                predicted_risk: predicted,
                confidence_band: ConfidenceBand {
                    lower: clamp_unit(predicted - half_width),
                    upper: clamp_unit(predicted + half_width),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shared::{BoundingBox, GeoPoint, WeatherSample};

    use crate::engine::favorability::favorability_series as compute_series;

    fn detection(confidence: f64, captured_at: DateTime<Utc>) -> Detection {
        Detection {
            image_id: Uuid::new_v4(),
            species_class: "aphid".to_string(),
            confidence,
            geo_location: GeoPoint::new(25.005, 85.005),
            captured_at,
            bounding_box: BoundingBox {
                x: 0.0,
                y: 0.0,
                w: 10.0,
                h: 10.0,
            },
        }
    }

    #[test]
    fn test_decay_halves_per_half_life() {
        assert!((decay(0.0, 72.0) - 1.0).abs() < 1e-12);
        assert!((decay(72.0, 72.0) - 0.5).abs() < 1e-12);
        assert!((decay(144.0, 72.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_density_non_increasing_without_new_detections() {
        let config = EngineConfig::default();
        let now = Utc::now();
        let history = vec![detection(0.9, now - Duration::hours(2)), detection(0.7, now)];

        let mut previous = f64::INFINITY;
        for hours in 0..48 {
            let at = now + Duration::hours(hours);
            let d = decayed_density(&history, 1.0, at, &config);
            assert!(d <= previous, "density rose at hour {hours}");
            previous = d;
        }
    }

    #[test]
    fn test_risk_clamped_for_any_magnitude() {
        let config = EngineConfig::default();
        let now = Utc::now();
        let history: Vec<Detection> = (0..5000).map(|_| detection(1.0, now)).collect();
        let risk = risk_score(&history, 0.001, 1.0, now, &config);
        assert!((0.0..=1.0).contains(&risk));

        let baseline = risk_score(&[], 1.0, 0.0, now, &config);
        assert_eq!(baseline, 0.0);
    }

    #[test]
    fn test_empty_history_gives_favorability_baseline() {
        let config = EngineConfig::default();
        let risk = risk_score(&[], 1.2, 0.6, Utc::now(), &config);
        assert!((risk - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_forecast_rises_with_upcoming_favorability() {
        // No detections; favorability climbs over the next day
        let config = EngineConfig::default();
        let now = Utc::now();
        let samples: Vec<WeatherSample> = (0..=24)
            .map(|h| {
                WeatherSample::complete(
                    now + Duration::hours(h),
                    26.0,
                    40.0 + 2.0 * h as f64,
                    0.0,
                    3.0,
                )
            })
            .collect();
        let series = compute_series(&samples, &config.favorability);

        let forecasts = project_forecast(
            Uuid::new_v4(),
            CellId::new(0, 0),
            &[],
            1.0,
            &series,
            now,
            24,
            &config,
        );
        assert_eq!(forecasts.len(), 8);
        let first = forecasts.first().unwrap().predicted_risk;
        let last = forecasts.last().unwrap().predicted_risk;
        assert!(last > first, "forecast should rise: {first} -> {last}");
    }

    #[test]
    fn test_forecast_band_widens_with_horizon() {
        let config = EngineConfig::default();
        let now = Utc::now();
        let samples: Vec<WeatherSample> = (0..=72)
            .map(|h| WeatherSample::complete(now + Duration::hours(h), 26.0, 70.0, 0.0, 3.0))
            .collect();
        let series = compute_series(&samples, &config.favorability);

        let forecasts = project_forecast(
            Uuid::new_v4(),
            CellId::new(0, 0),
            &[detection(0.9, now)],
            1.0,
            &series,
            now,
            72,
            &config,
        );
        let widths: Vec<f64> = forecasts
            .iter()
            .map(|f| f.confidence_band.upper - f.confidence_band.lower)
            .collect();
        for pair in widths.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        for f in &forecasts {
            assert!(f.confidence_band.lower <= f.predicted_risk);
            assert!(f.predicted_risk <= f.confidence_band.upper);
            assert!((0.0..=1.0).contains(&f.confidence_band.lower));
            assert!((0.0..=1.0).contains(&f.confidence_band.upper));
        }
    }

    #[test]
    fn test_steps_before_series_start_score_neutral() {
        let config = EngineConfig::default();
        let now = Utc::now();
        // Forecast-only series starting 40 hours out
        let samples: Vec<WeatherSample> = (40..=80)
            .map(|h| WeatherSample::complete(now + Duration::hours(h), 26.0, 85.0, 0.0, 3.0))
            .collect();
        let series = compute_series(&samples, &config.favorability);

        let forecasts = project_forecast(
            Uuid::new_v4(),
            CellId::new(0, 0),
            &[],
            1.0,
            &series,
            now,
            72,
            &config,
        );

        // The +3h step precedes the series: neutral contribution, not zero
        let early = &forecasts[0];
        assert!((early.predicted_risk - 0.25).abs() < 1e-12);

        // A step inside the fully favorable series scores higher
        let covered = forecasts
            .iter()
            .find(|f| f.horizon_timestamp >= now + Duration::hours(42))
            .unwrap();
        assert!((covered.predicted_risk - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_favorability_at_picks_newest_at_or_before() {
        let now = Utc::now();
        let config = EngineConfig::default();
        let samples = vec![
            WeatherSample::complete(now - Duration::hours(2), 26.0, 80.0, 0.0, 3.0),
            WeatherSample::complete(now - Duration::hours(1), 10.0, 30.0, 0.0, 3.0),
        ];
        let series = compute_series(&samples, &config.favorability);

        let picked = favorability_at(&series, now).unwrap();
        assert!((picked - series[1].value).abs() < 1e-12);
        assert!(favorability_at(&series, now - Duration::hours(3)).is_none());
    }
}
