//! Validation utilities for the Pest Outbreak Forecaster
//!
//! Record-level checks used at ingestion boundaries. Failures here mean
//! "skip this record", never "abort the batch".

use crate::models::RawBox;
use crate::types::GeoPoint;

/// Validate a latitude in decimal degrees
pub fn validate_latitude(latitude: f64) -> Result<(), &'static str> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90 degrees");
    }
    Ok(())
}

/// Validate a longitude in decimal degrees
pub fn validate_longitude(longitude: f64) -> Result<(), &'static str> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180 degrees");
    }
    Ok(())
}

/// Validate a GPS coordinate pair
pub fn validate_geo_point(point: GeoPoint) -> Result<(), &'static str> {
    validate_latitude(point.latitude)?;
    validate_longitude(point.longitude)
}

/// Validate a confidence, probability, or index value in `[0,1]`
pub fn validate_unit_interval(value: f64) -> Result<(), &'static str> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err("Value must be between 0 and 1");
    }
    Ok(())
}

/// Validate one raw detector box
pub fn validate_raw_box(raw: &RawBox) -> Result<(), &'static str> {
    if !raw.x.is_finite() || !raw.y.is_finite() {
        return Err("Box coordinates must be finite");
    }
    if !raw.w.is_finite() || !raw.h.is_finite() || raw.w <= 0.0 || raw.h <= 0.0 {
        return Err("Box dimensions must be positive");
    }
    if raw.class.trim().is_empty() {
        return Err("Box is missing a species class");
    }
    validate_unit_interval(raw.score).map_err(|_| "Box score must be between 0 and 1")
}
